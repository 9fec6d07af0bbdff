use std::time::Duration;

use crate::CombatEncounter;

/// Delay between two exchanges when the host does not choose one.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1500);

/// Paces an encounter against elapsed time.
///
/// The host reports elapsed time through [`CombatController::advance`];
/// every whole tick interval becomes one exchange. Leftover time carries
/// over to the next call.
#[derive(Clone, Debug)]
pub struct CombatController {
    encounter: CombatEncounter,
    tick_interval: Duration,
    accumulator: Duration,
    stopped: bool,
}

impl CombatController {
    /// Starts `encounter` and paces it at [`DEFAULT_TICK_INTERVAL`].
    #[must_use]
    pub fn new(encounter: CombatEncounter) -> Self {
        Self::with_interval(encounter, DEFAULT_TICK_INTERVAL)
    }

    /// Starts `encounter` and paces it at `tick_interval`.
    #[must_use]
    pub fn with_interval(mut encounter: CombatEncounter, tick_interval: Duration) -> Self {
        encounter.start();
        Self {
            encounter,
            tick_interval,
            accumulator: Duration::ZERO,
            stopped: false,
        }
    }

    /// Feeds elapsed time and returns how many exchanges were resolved.
    pub fn advance(&mut self, dt: Duration) -> usize {
        if self.stopped || self.tick_interval.is_zero() || self.is_finished() {
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let mut ticks = 0;
        while self.accumulator >= self.tick_interval && !self.is_finished() {
            self.accumulator -= self.tick_interval;
            self.encounter.tick();
            ticks += 1;
        }
        if self.is_finished() {
            self.accumulator = Duration::ZERO;
        }
        ticks
    }

    /// Cancels pacing. Later calls to [`CombatController::advance`] do nothing.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.accumulator = Duration::ZERO;
    }

    /// Whether [`CombatController::stop`] was called.
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Whether the encounter has reached a verdict.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.encounter.state().is_active
    }

    /// Paced encounter.
    #[must_use]
    pub const fn encounter(&self) -> &CombatEncounter {
        &self.encounter
    }

    /// Consumes the controller, yielding the encounter.
    #[must_use]
    pub fn into_encounter(self) -> CombatEncounter {
        self.encounter
    }
}
