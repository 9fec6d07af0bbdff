//! Copy-on-write transitions over [`GameState`] snapshots.
//!
//! Each function borrows the current snapshot and either returns a new one or
//! a [`TransitionError`]. The input snapshot is never modified, so a failed
//! transition cannot leave a half-applied state behind.

use rand::Rng;
use warband_catalog::Catalog;
use warband_core::{NodeId, TemplateId, TransitionError, UnitId};
use warband_system_map_generation::MapGenerator;

use crate::GameState;

/// Starts a run on floor one with a freshly generated map.
pub fn create_initial_game_state<R: Rng + ?Sized>(
    generator: &MapGenerator,
    rng: &mut R,
) -> GameState {
    GameState::new(generator.generate(1, rng))
}

/// Enters `node`, which must currently be available.
///
/// Node flags are left as they are; only [`complete_node`] moves the frontier.
pub fn move_to_node(state: &GameState, node: NodeId) -> Result<GameState, TransitionError> {
    let target = state
        .map
        .node(node)
        .ok_or(TransitionError::UnknownNode(node))?;
    if !target.available {
        return Err(TransitionError::NodeUnavailable(node));
    }

    let mut next = state.clone();
    next.current_node = Some(node);
    Ok(next)
}

/// Marks `node` resolved and makes exactly its connection targets available.
pub fn complete_node(state: &GameState, node: NodeId) -> Result<GameState, TransitionError> {
    let targets = state
        .map
        .node(node)
        .ok_or(TransitionError::UnknownNode(node))?
        .connections
        .clone();

    let mut next = state.clone();
    for candidate in &mut next.map.nodes {
        if candidate.id == node {
            candidate.completed = true;
            candidate.available = false;
        } else {
            candidate.available = targets.contains(&candidate.id);
        }
    }
    next.current_node = Some(node);
    Ok(next)
}

/// Moves the run to the next floor with a new map.
///
/// Gold, roster and roster capacity carry over.
pub fn advance_to_next_floor<R: Rng + ?Sized>(
    state: &GameState,
    generator: &MapGenerator,
    rng: &mut R,
) -> GameState {
    let floor = state.floor.saturating_add(1);
    let mut next = state.clone();
    next.map = generator.generate(floor, rng);
    next.floor = floor;
    next.current_node = None;
    next
}

/// Adds `amount` gold.
#[must_use]
pub fn earn_gold(state: &GameState, amount: u32) -> GameState {
    let mut next = state.clone();
    next.gold = next.gold.saturating_add(amount);
    next
}

/// Removes `amount` gold, refusing to go below zero.
pub fn spend_gold(state: &GameState, amount: u32) -> Result<GameState, TransitionError> {
    ensure_affordable(state, amount)?;
    let mut next = state.clone();
    next.gold -= amount;
    Ok(next)
}

/// Adds a hero built from `template` at `level` to the end of the roster.
pub fn recruit_unit(
    state: &GameState,
    catalog: &Catalog,
    template: &TemplateId,
    level: u32,
) -> Result<GameState, TransitionError> {
    ensure_roster_has_room(state)?;
    let mut next = state.clone();
    let unit = catalog.create_unit(template, level, &mut next.unit_ids)?;
    next.player_team.push(unit);
    Ok(next)
}

/// Buys a level one hero: gold and roster space are checked together and
/// neither changes unless both checks pass.
pub fn purchase_unit(
    state: &GameState,
    catalog: &Catalog,
    template: &TemplateId,
    cost: u32,
) -> Result<GameState, TransitionError> {
    let _ = catalog.hero(template)?;
    ensure_roster_has_room(state)?;
    ensure_affordable(state, cost)?;

    let paid = spend_gold(state, cost)?;
    recruit_unit(&paid, catalog, template, 1)
}

/// Removes `unit` from the roster, keeping the order of the others.
pub fn dismiss_unit(state: &GameState, unit: UnitId) -> Result<GameState, TransitionError> {
    let position = roster_position(state, unit)?;
    let mut next = state.clone();
    let _ = next.player_team.remove(position);
    Ok(next)
}

/// Raises `unit` by one level using its template growth.
pub fn upgrade_unit(
    state: &GameState,
    catalog: &Catalog,
    unit: UnitId,
) -> Result<GameState, TransitionError> {
    let position = roster_position(state, unit)?;
    let current = &state.player_team[position];
    let template = catalog.hero(&current.template_id)?;
    let upgraded = warband_catalog::upgrade_unit(current, template);

    let mut next = state.clone();
    next.player_team[position] = upgraded;
    Ok(next)
}

/// Grows the roster capacity by `amount`.
#[must_use]
pub fn increase_max_team_size(state: &GameState, amount: u32) -> GameState {
    let mut next = state.clone();
    next.max_team_size = next.max_team_size.saturating_add(amount);
    next
}

fn ensure_affordable(state: &GameState, amount: u32) -> Result<(), TransitionError> {
    if amount > state.gold {
        return Err(TransitionError::InsufficientGold {
            required: amount,
            available: state.gold,
        });
    }
    Ok(())
}

fn ensure_roster_has_room(state: &GameState) -> Result<(), TransitionError> {
    if state.player_team.len() >= state.max_team_size as usize {
        return Err(TransitionError::RosterFull {
            capacity: state.max_team_size,
        });
    }
    Ok(())
}

fn roster_position(state: &GameState, unit: UnitId) -> Result<usize, TransitionError> {
    state
        .player_team
        .iter()
        .position(|member| member.id == unit)
        .ok_or(TransitionError::UnknownUnit(unit))
}
