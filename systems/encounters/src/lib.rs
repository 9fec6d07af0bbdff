#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Non-combat encounters of a run.
//!
//! Each encounter reads the current [`warband_world::GameState`] and emits
//! [`warband_core::Command`]s for the run state manager to apply. Checks that
//! a player would see as disabled buttons are made up front and reported
//! as [`EncounterError`]s, so no command is emitted for a choice that
//! cannot succeed.

mod mystery;
mod shop;
mod starting_team;
mod treasure;

pub use mystery::{
    take_team_size_bonus, GambleOutcome, GambleProgress, PendingGamble, GAMBLE_DELAY,
    GAMBLE_REWARD, GAMBLE_STAKE, TEAM_SIZE_BONUS,
};
pub use shop::{Shop, ShopListing};
pub use starting_team::StartingTeam;
pub use treasure::{claim_treasure, preview_upgrade, TreasureChoice, TREASURE_GOLD};

use warband_core::{CatalogError, TemplateId, UnitId};

/// Reasons an encounter choice is refused.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EncounterError {
    /// The roster has no free slot.
    #[error("roster is full ({capacity} units)")]
    RosterFull {
        /// Maximum roster size.
        capacity: u32,
    },
    /// The purse cannot cover the choice.
    #[error("insufficient gold: required {required}, available {available}")]
    InsufficientGold {
        /// Gold the choice costs.
        required: u32,
        /// Gold held.
        available: u32,
    },
    /// The merchant does not offer the template on this floor.
    #[error("{0} is not for sale here")]
    NotForSale(TemplateId),
    /// The unit is not part of the roster.
    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),
    /// No starting team goes by the name.
    #[error("unknown starting team: {0}")]
    UnknownStartingTeam(String),
    /// A referenced template does not exist.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
