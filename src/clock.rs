use crate::utility::types::Timeslot;

/// A clock that hands out consecutive timeslots over a fixed run length.
///
/// # Examples
///
/// ```
/// use du_sim::clock::Clock;
///
/// let mut clock = Clock::starting_at(360, 3);
/// let mut slots = Vec::new();
///
/// clock.run(|slot| slots.push(slot));
/// assert_eq!(slots, vec![360, 361, 362]);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    /// First timeslot of the run
    first: Timeslot,
    /// Ticks handed out so far
    current: usize,
    /// Total ticks in the run
    total: usize,
}

impl Clock {
    /// Creates a clock running `total` ticks from timeslot 0.
    pub fn new(total: usize) -> Self {
        Self::starting_at(0, total)
    }

    /// Creates a clock running `total` ticks starting at `first`.
    ///
    /// # Arguments
    ///
    /// * `first` - Timeslot of the first tick
    /// * `total` - Number of ticks the clock will run
    pub fn starting_at(first: Timeslot, total: usize) -> Self {
        Self {
            first,
            current: 0,
            total,
        }
    }

    /// Advances the clock by one tick.
    ///
    /// # Returns
    ///
    /// * `Some(timeslot)` - The timeslot of this tick
    /// * `None` - If the clock has run all its ticks
    pub fn tick(&mut self) -> Option<Timeslot> {
        if self.current < self.total {
            let slot = self.first + self.current;
            self.current += 1;
            Some(slot)
        } else {
            None
        }
    }

    /// Number of ticks not yet handed out.
    pub fn remaining(&self) -> usize {
        self.total - self.current
    }

    /// Runs a function for each remaining tick.
    pub fn run(&mut self, mut f: impl FnMut(Timeslot)) {
        while let Some(slot) = self.tick() {
            f(slot);
        }
    }

    /// Runs a fallible function for each remaining tick, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `f`.
    pub fn try_run<E>(&mut self, mut f: impl FnMut(Timeslot) -> Result<(), E>) -> Result<(), E> {
        while let Some(slot) = self.tick() {
            f(slot)?;
        }
        Ok(())
    }
}
