//! Build script for anemos-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates node.toml and bakes it into the binary as `NODE_CONFIG`

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Largest encoded radio packet (SYNC + LENGTH + 32 payload + CRC)
const MAX_FRAME_BYTES: u64 = 35;

/// Sensor conversion time plus margin
const MEASUREMENT_TIME_MS: u64 = 10;

/// Validated node settings, defaults filled in
struct NodeSettings {
    core_clock_hz: u64,
    measurement_interval_ms: u64,
    scl_high_us: u64,
    scl_low_us: u64,
    bit_rate_hz: u64,
    lead_in_ticks: u64,
    sensor_address: u64,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            core_clock_hz: 125_000_000,
            measurement_interval_ms: 60_000,
            scl_high_us: 5,
            scl_low_us: 5,
            bit_rate_hz: 2_000,
            lead_in_ticks: 20,
            sensor_address: 0x76,
        }
    }
}

fn main() {
    setup_linker();
    let settings = validate_config();
    generate_config(&settings);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate node.toml configuration at compile time
fn validate_config() -> NodeSettings {
    println!("cargo:rerun-if-changed=node.toml");

    let config_path = Path::new("node.toml");

    // A missing file means all defaults
    if !config_path.exists() {
        println!("cargo:warning=node.toml not found, using default node configuration");
        return NodeSettings::default();
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read node.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in node.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    let settings = read_settings(&config, &mut errors);
    check_ranges(&settings, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid node configuration                               ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=node.toml validated successfully");
    settings
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Known sections and the keys each accepts
const SCHEMA: &[(&str, &[&str])] = &[
    ("node", &["core_clock_hz", "measurement_interval_ms"]),
    ("bus", &["scl_high_us", "scl_low_us"]),
    ("radio", &["bit_rate_hz", "lead_in_ticks"]),
    ("sensor", &["address"]),
];

/// Pull settings out of the parsed file, keeping defaults for absent keys
fn read_settings(config: &toml::Value, errors: &mut Vec<String>) -> NodeSettings {
    let mut settings = NodeSettings::default();

    let root = match config.as_table() {
        Some(t) => t,
        None => return settings,
    };

    for (section, value) in root {
        let keys = match SCHEMA.iter().find(|(name, _)| *name == section.as_str()) {
            Some((_, keys)) => *keys,
            None => {
                errors.push(format!("unknown section [{}]", section));
                continue;
            }
        };

        let table = match value.as_table() {
            Some(t) => t,
            None => {
                errors.push(format!("[{}] must be a table", section));
                continue;
            }
        };

        for (key, value) in table {
            if !keys.contains(&key.as_str()) {
                errors.push(format!("[{}] unknown key '{}'", section, key));
                continue;
            }

            let number = match value {
                toml::Value::Integer(n) if *n >= 0 => *n as u64,
                _ => {
                    errors.push(format!("[{}] {} must be a non-negative integer", section, key));
                    continue;
                }
            };

            let slot = match (section.as_str(), key.as_str()) {
                ("node", "core_clock_hz") => &mut settings.core_clock_hz,
                ("node", "measurement_interval_ms") => &mut settings.measurement_interval_ms,
                ("bus", "scl_high_us") => &mut settings.scl_high_us,
                ("bus", "scl_low_us") => &mut settings.scl_low_us,
                ("radio", "bit_rate_hz") => &mut settings.bit_rate_hz,
                ("radio", "lead_in_ticks") => &mut settings.lead_in_ticks,
                ("sensor", "address") => &mut settings.sensor_address,
                _ => continue,
            };
            *slot = number;
        }
    }

    settings
}

/// Check each setting against what the hardware and protocol engines accept
fn check_ranges(s: &NodeSettings, errors: &mut Vec<String>) {
    if !(1_000_000..=200_000_000).contains(&s.core_clock_hz) {
        errors.push("[node] core_clock_hz must be 1 MHz - 200 MHz".to_string());
    }

    if !(1..=1_000).contains(&s.scl_high_us) {
        errors.push("[bus] scl_high_us must be 1-1000".to_string());
    }

    if !(1..=1_000).contains(&s.scl_low_us) {
        errors.push("[bus] scl_low_us must be 1-1000".to_string());
    }

    if !(100..=10_000).contains(&s.bit_rate_hz) {
        errors.push("[radio] bit_rate_hz must be 100-10000".to_string());
    }

    if s.lead_in_ticks > u16::MAX as u64 {
        errors.push(format!("[radio] lead_in_ticks must be at most {}", u16::MAX));
    }

    if s.sensor_address != 0x76 && s.sensor_address != 0x77 {
        errors.push("[sensor] address must be 0x76 or 0x77".to_string());
    }

    if s.measurement_interval_ms > u32::MAX as u64 {
        errors.push("[node] measurement_interval_ms does not fit in 32 bits".to_string());
    }

    // A cycle must fit the conversion and a full-size transmission
    if (100..=10_000).contains(&s.bit_rate_hz) {
        let ticks = s.lead_in_ticks + 16 * MAX_FRAME_BYTES;
        let airtime_ms = (ticks * 1_000).div_ceil(2 * s.bit_rate_hz);
        let minimum = MEASUREMENT_TIME_MS + airtime_ms;
        if s.measurement_interval_ms <= minimum {
            errors.push(format!(
                "[node] measurement_interval_ms must exceed {} ms",
                minimum
            ));
        }
    }
}

/// Write the validated settings as a `NodeConfig` constant
fn generate_config(s: &NodeSettings) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut f = File::create(out_dir.join("node_config.rs")).unwrap();

    writeln!(
        f,
        "/// Node configuration from node.toml\n\
         pub const NODE_CONFIG: NodeConfig = NodeConfig {{\n    \
             core_clock_hz: {},\n    \
             bus: BusTiming {{\n        scl_high_us: {},\n        scl_low_us: {},\n    }},\n    \
             radio: RadioConfig {{\n        bit_rate_hz: {},\n        lead_in_ticks: {},\n    }},\n    \
             sensor_address: {:#04x},\n    \
             measurement_interval_ms: {},\n\
         }};",
        s.core_clock_hz,
        s.scl_high_us,
        s.scl_low_us,
        s.bit_rate_hz,
        s.lead_in_ticks,
        s.sensor_address,
        s.measurement_interval_ms,
    )
    .unwrap();
}
