use std::time::Duration;

use rand::Rng;
use tracing::debug;
use warband_core::Command;
use warband_world::GameState;

use crate::EncounterError;

/// Gold put at risk by the coin flip.
pub const GAMBLE_STAKE: u32 = 100;

/// Gold won on a successful coin flip.
pub const GAMBLE_REWARD: u32 = 250;

/// Suspense before the coin lands.
pub const GAMBLE_DELAY: Duration = Duration::from_millis(1500);

/// Roster slots granted by the recruiting offer.
pub const TEAM_SIZE_BONUS: u32 = 1;

/// Emits the roster capacity reward.
pub fn take_team_size_bonus(out: &mut Vec<Command>) {
    out.push(Command::IncreaseMaxTeamSize {
        amount: TEAM_SIZE_BONUS,
    });
}

/// How a coin flip ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GambleOutcome {
    /// The party gains [`GAMBLE_REWARD`].
    Won,
    /// The party loses [`GAMBLE_STAKE`].
    Lost,
}

impl GambleOutcome {
    /// Signed change of the purse.
    #[must_use]
    pub const fn gold_change(self) -> i64 {
        match self {
            Self::Won => GAMBLE_REWARD as i64,
            Self::Lost => -(GAMBLE_STAKE as i64),
        }
    }

    fn command(self) -> Command {
        match self {
            Self::Won => Command::EarnGold {
                amount: GAMBLE_REWARD,
            },
            Self::Lost => Command::SpendGold {
                amount: GAMBLE_STAKE,
            },
        }
    }
}

/// Progress reported by [`PendingGamble::advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GambleProgress {
    /// The coin is still in the air.
    Pending,
    /// The coin landed.
    Resolved(GambleOutcome),
    /// The flip was called off before landing.
    Cancelled,
}

/// A coin flip waiting out its suspense delay.
#[derive(Clone, Debug)]
pub struct PendingGamble {
    remaining: Duration,
    progress: GambleProgress,
}

impl PendingGamble {
    /// Places the stake with the default [`GAMBLE_DELAY`].
    pub fn place(state: &GameState) -> Result<Self, EncounterError> {
        Self::with_delay(state, GAMBLE_DELAY)
    }

    /// Places the stake; the party must hold at least [`GAMBLE_STAKE`] gold.
    pub fn with_delay(state: &GameState, delay: Duration) -> Result<Self, EncounterError> {
        if state.gold() < GAMBLE_STAKE {
            return Err(EncounterError::InsufficientGold {
                required: GAMBLE_STAKE,
                available: state.gold(),
            });
        }
        Ok(Self {
            remaining: delay,
            progress: GambleProgress::Pending,
        })
    }

    /// Lets `dt` pass. The flip is decided once the delay has elapsed, and
    /// only then is its gold command emitted. Later calls repeat the
    /// recorded progress without emitting anything.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        dt: Duration,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) -> GambleProgress {
        if self.progress != GambleProgress::Pending {
            return self.progress;
        }

        self.remaining = self.remaining.saturating_sub(dt);
        if !self.remaining.is_zero() {
            return GambleProgress::Pending;
        }

        let outcome = if rng.gen_bool(0.5) {
            GambleOutcome::Won
        } else {
            GambleOutcome::Lost
        };
        debug!(?outcome, "coin landed");
        out.push(outcome.command());
        self.progress = GambleProgress::Resolved(outcome);
        self.progress
    }

    /// Calls the flip off. Has no effect once the coin landed.
    pub fn cancel(&mut self) {
        if self.progress == GambleProgress::Pending {
            self.progress = GambleProgress::Cancelled;
        }
    }

    /// Suspense left before the coin lands.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        self.remaining
    }
}
