//! GPIO pin abstractions
//!
//! Provides traits for the two kinds of line the node drives: open-drain
//! bus lines and a push-pull radio data line.

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Toggle the pin state
    fn toggle(&mut self) {
        if self.is_set_high() {
            self.set_low();
        } else {
            self.set_high();
        }
    }

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;

    /// Check if the pin is currently set low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Open-drain bus line
///
/// A line in this mode has exactly two driven states: released
/// (tri-stated input, the external pull-up sets the level high) and
/// driven low. Nothing in this trait drives the line high.
pub trait OpenDrainPin {
    /// Release the line to a tri-stated input
    fn release(&mut self);

    /// Release the line with the internal pull-up enabled
    ///
    /// Some pin hardware needs this intermediate state to get a clean
    /// rising edge before the line is asserted. Defaults to a plain release.
    fn release_pulled_up(&mut self) {
        self.release();
    }

    /// Actively sink the line low
    fn drive_low(&mut self);

    /// Read the resolved line level
    ///
    /// Takes `&mut self` because some ports need a mode switch to sample.
    fn is_high(&mut self) -> bool;

    /// Read the resolved line level as low
    fn is_low(&mut self) -> bool {
        !self.is_high()
    }
}
