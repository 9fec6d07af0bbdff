use warband_catalog::Catalog;
use warband_core::{CombatUnit, Command, UnitId};
use warband_world::GameState;

use crate::EncounterError;

/// Gold granted when the party takes the coin chest.
pub const TREASURE_GOLD: u32 = 200;

/// Reward picked in a treasure room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreasureChoice {
    /// Take [`TREASURE_GOLD`] gold.
    Gold,
    /// Raise one roster unit by a level.
    Upgrade(UnitId),
}

/// Emits the command for the chosen treasure reward.
pub fn claim_treasure(
    state: &GameState,
    choice: TreasureChoice,
    out: &mut Vec<Command>,
) -> Result<(), EncounterError> {
    match choice {
        TreasureChoice::Gold => out.push(Command::EarnGold {
            amount: TREASURE_GOLD,
        }),
        TreasureChoice::Upgrade(unit) => {
            let _ = roster_unit(state, unit)?;
            out.push(Command::UpgradeUnit { unit });
        }
    }
    Ok(())
}

/// Shows what `unit` would look like one level higher.
pub fn preview_upgrade(
    state: &GameState,
    catalog: &Catalog,
    unit: UnitId,
) -> Result<CombatUnit, EncounterError> {
    let current = roster_unit(state, unit)?;
    let template = catalog.hero(&current.template_id)?;
    Ok(warband_catalog::upgrade_unit(current, template))
}

fn roster_unit(state: &GameState, unit: UnitId) -> Result<&CombatUnit, EncounterError> {
    state
        .player_team()
        .iter()
        .find(|member| member.id == unit)
        .ok_or(EncounterError::UnknownUnit(unit))
}
