//! Binary brush (pen) actuator.

use plotter_common::hal::BrushDriver;
use tracing::debug;

/// Tracks and drives the brush drop/raise output.
///
/// Both operations take effect immediately; there is no tick-side work.
#[derive(Debug)]
pub struct BrushActuator<B> {
    driver: B,
    down: bool,
}

impl<B: BrushDriver> BrushActuator<B> {
    /// Take ownership of the output and force it to the raised position.
    pub fn new(mut driver: B) -> Self {
        driver.set_brush(false);
        Self {
            driver,
            down: false,
        }
    }

    /// Lower the brush onto the paper.
    pub fn drop(&mut self) {
        self.set(true);
    }

    /// Lift the brush off the paper.
    pub fn raise(&mut self) {
        self.set(false);
    }

    #[inline]
    pub fn is_down(&self) -> bool {
        self.down
    }

    #[inline]
    pub fn driver(&self) -> &B {
        &self.driver
    }

    fn set(&mut self, down: bool) {
        if down != self.down {
            debug!(down, "brush");
        }
        self.down = down;
        self.driver.set_brush(down);
    }
}
