//! Simulated two-wire bus for host tests
//!
//! Both master lines share one [`Wire`] through a `RefCell`. The wire
//! resolves the open-drain levels, logs START/STOP conditions and every
//! bit seen on a rising clock edge, and runs a scripted [`Responder`]
//! that answers like a single register device.

use core::cell::RefCell;

use anemos_hal::gpio::OpenDrainPin;
use embedded_hal::delay::DelayNs;
use heapless::{Deque, Vec};

const LOG_CAPACITY: usize = 1024;
const DATA_CAPACITY: usize = 64;

/// Observable bus event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// Data fell while clock high
    Start,
    /// Data rose while clock high
    Stop,
    /// Data level at a rising clock edge
    Bit(bool),
}

/// Decoded bus activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Start,
    Stop,
    Byte { value: u8, acked: bool },
}

/// Group logged bits into bytes plus their ninth (acknowledge) bit
///
/// Clock edges that do not complete a nine-bit frame before the next
/// condition are dropped, like a logic analyzer would.
pub fn decode(log: &[BusEvent]) -> Vec<Token, 128> {
    let mut tokens = Vec::new();
    let mut bits: u16 = 0;
    let mut count = 0;

    for event in log {
        match *event {
            BusEvent::Start | BusEvent::Stop => {
                bits = 0;
                count = 0;
                let token = if *event == BusEvent::Start {
                    Token::Start
                } else {
                    Token::Stop
                };
                tokens.push(token).unwrap();
            }
            BusEvent::Bit(level) => {
                bits = (bits << 1) | level as u16;
                count += 1;
                if count == 9 {
                    tokens
                        .push(Token::Byte {
                            value: (bits >> 1) as u8,
                            acked: bits & 1 == 0,
                        })
                        .unwrap();
                    bits = 0;
                    count = 0;
                }
            }
        }
    }
    tokens
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Receiving { address_phase: bool },
    Transmitting,
}

/// Scripted responder device
pub struct Responder {
    address: u8,
    ack_data: bool,
    mode: Mode,
    read_requested: bool,
    /// Rising clock edges seen in the current nine-bit frame
    edges: u8,
    shift: u8,
    tx_data: Deque<u8, DATA_CAPACITY>,
    tx_byte: u8,
    last_master_ack: bool,
    pulling_low: bool,
    /// Data bytes written to the device (address bytes excluded)
    pub received: Vec<u8, DATA_CAPACITY>,
    /// Acknowledge bits the master sent after each byte read (true = ACK)
    pub master_acks: Vec<bool, DATA_CAPACITY>,
}

impl Responder {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            ack_data: true,
            mode: Mode::Idle,
            read_requested: false,
            edges: 0,
            shift: 0,
            tx_data: Deque::new(),
            tx_byte: 0xFF,
            last_master_ack: false,
            pulling_low: false,
            received: Vec::new(),
            master_acks: Vec::new(),
        }
    }

    /// Bytes returned, in order, by read-addressed transactions
    pub fn with_read_data(mut self, data: &[u8]) -> Self {
        for &byte in data {
            self.tx_data.push_back(byte).unwrap();
        }
        self
    }

    /// Acknowledge the address but refuse every data byte
    pub fn refuse_data(mut self) -> Self {
        self.ack_data = false;
        self
    }

    fn on_start(&mut self) {
        self.mode = Mode::Receiving {
            address_phase: true,
        };
        self.edges = 0;
        self.shift = 0;
        self.pulling_low = false;
    }

    fn on_stop(&mut self) {
        self.mode = Mode::Idle;
        self.pulling_low = false;
    }

    fn on_rising(&mut self, sda: bool) {
        match self.mode {
            Mode::Idle => return,
            Mode::Receiving { .. } => {
                if self.edges < 8 {
                    self.shift = (self.shift << 1) | sda as u8;
                }
            }
            Mode::Transmitting => {
                if self.edges == 8 {
                    self.last_master_ack = !sda;
                    self.master_acks.push(!sda).unwrap();
                }
            }
        }
        self.edges += 1;
    }

    fn on_falling(&mut self) {
        match self.mode {
            Mode::Idle => {}
            Mode::Receiving { address_phase } => match self.edges {
                8 => {
                    let byte = self.shift;
                    let ack = if address_phase {
                        let selected = byte >> 1 == self.address;
                        self.read_requested = byte & 1 == 1;
                        selected
                    } else {
                        self.received.push(byte).unwrap();
                        self.ack_data
                    };
                    self.pulling_low = ack;
                    if !ack && address_phase {
                        self.mode = Mode::Idle;
                    }
                }
                9 => {
                    self.pulling_low = false;
                    self.edges = 0;
                    self.shift = 0;
                    if address_phase {
                        if self.read_requested {
                            self.mode = Mode::Transmitting;
                            self.load_next();
                        } else {
                            self.mode = Mode::Receiving {
                                address_phase: false,
                            };
                        }
                    }
                }
                _ => {}
            },
            Mode::Transmitting => match self.edges {
                1..=7 => self.drive_bit(7 - self.edges),
                8 => self.pulling_low = false,
                9 => {
                    self.edges = 0;
                    if self.last_master_ack {
                        self.load_next();
                    } else {
                        self.pulling_low = false;
                        self.mode = Mode::Idle;
                    }
                }
                _ => {}
            },
        }
    }

    fn load_next(&mut self) {
        self.tx_byte = self.tx_data.pop_front().unwrap_or(0xFF);
        self.drive_bit(7);
    }

    fn drive_bit(&mut self, bit: u8) {
        self.pulling_low = (self.tx_byte >> bit) & 1 == 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Sda,
    Scl,
}

/// Shared bus state
pub struct Wire {
    sda_released: bool,
    scl_released: bool,
    now_ns: u64,
    last_rise_ns: Option<u64>,
    pub log: Vec<BusEvent, LOG_CAPACITY>,
    pub responder: Responder,
    /// Time from the clock rising edge to each master data sample
    pub sample_offsets_ns: Vec<u64, 256>,
    /// Duration of every completed clock high phase
    pub high_phases_ns: Vec<u64, 256>,
}

impl Wire {
    pub fn new(responder: Responder) -> Self {
        Self {
            sda_released: true,
            scl_released: true,
            now_ns: 0,
            last_rise_ns: None,
            log: Vec::new(),
            responder,
            sample_offsets_ns: Vec::new(),
            high_phases_ns: Vec::new(),
        }
    }

    /// Resolved data level
    pub fn sda(&self) -> bool {
        self.sda_released && !self.responder.pulling_low
    }

    /// Resolved clock level
    pub fn scl(&self) -> bool {
        self.scl_released
    }

    pub fn sda_released(&self) -> bool {
        self.sda_released
    }

    /// Both master lines tri-stated
    pub fn lines_released(&self) -> bool {
        self.sda_released && self.scl_released
    }

    /// Drive both master lines low, as left by a reset mid-transfer
    pub fn force_low(&mut self) {
        self.sda_released = false;
        self.scl_released = false;
    }

    fn set(&mut self, line: Line, released: bool) {
        let (sda_before, scl_before) = (self.sda(), self.scl());
        match line {
            Line::Sda => self.sda_released = released,
            Line::Scl => self.scl_released = released,
        }
        let (sda, scl) = (self.sda(), self.scl());

        if scl_before && scl && sda_before != sda {
            if sda {
                self.log.push(BusEvent::Stop).unwrap();
                self.responder.on_stop();
            } else {
                self.log.push(BusEvent::Start).unwrap();
                self.responder.on_start();
            }
        }

        if !scl_before && scl {
            self.last_rise_ns = Some(self.now_ns);
            self.log.push(BusEvent::Bit(sda)).unwrap();
            self.responder.on_rising(sda);
        }

        if scl_before && !scl {
            if let Some(rise) = self.last_rise_ns {
                self.high_phases_ns.push(self.now_ns - rise).unwrap();
            }
            self.responder.on_falling();
        }
    }

    fn sample(&mut self, line: Line) -> bool {
        match line {
            Line::Sda => {
                if let Some(rise) = self.last_rise_ns {
                    self.sample_offsets_ns.push(self.now_ns - rise).unwrap();
                }
                self.sda()
            }
            Line::Scl => self.scl(),
        }
    }
}

/// One master line attached to a [`Wire`]
pub struct SimPin<'a> {
    wire: &'a RefCell<Wire>,
    line: Line,
}

impl<'a> SimPin<'a> {
    pub fn sda(wire: &'a RefCell<Wire>) -> Self {
        Self {
            wire,
            line: Line::Sda,
        }
    }

    pub fn scl(wire: &'a RefCell<Wire>) -> Self {
        Self {
            wire,
            line: Line::Scl,
        }
    }
}

impl OpenDrainPin for SimPin<'_> {
    fn release(&mut self) {
        self.wire.borrow_mut().set(self.line, true);
    }

    fn drive_low(&mut self) {
        self.wire.borrow_mut().set(self.line, false);
    }

    fn is_high(&mut self) -> bool {
        self.wire.borrow_mut().sample(self.line)
    }
}

/// Delay that advances the wire's clock instead of waiting
pub struct SimDelay<'a> {
    wire: &'a RefCell<Wire>,
}

impl<'a> SimDelay<'a> {
    pub fn new(wire: &'a RefCell<Wire>) -> Self {
        Self { wire }
    }
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.wire.borrow_mut().now_ns += ns as u64;
    }
}
