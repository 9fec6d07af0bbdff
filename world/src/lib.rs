#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative run state for Warband.
//!
//! [`GameState`] is an immutable snapshot. The functions in [`transitions`]
//! derive new snapshots from old ones, and [`RunStateManager`] owns the
//! current snapshot together with the collaborators those transitions need.
//! All mutations go through [`apply`], which reports what changed as
//! [`Event`]s.

pub mod transitions;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use warband_catalog::Catalog;
use warband_core::{
    CombatUnit, Command, Event, GameMap, NodeId, TemplateId, TransitionError, UnitIdAllocator,
};
use warband_system_map_generation::MapGenerator;

/// Gold held at the start of a run.
pub const INITIAL_GOLD: u32 = 100;

/// Roster capacity at the start of a run.
pub const DEFAULT_MAX_TEAM_SIZE: u32 = 3;

/// Snapshot of a run between encounters.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    gold: u32,
    map: GameMap,
    current_node: Option<NodeId>,
    floor: u32,
    player_team: Vec<CombatUnit>,
    max_team_size: u32,
    unit_ids: UnitIdAllocator,
}

impl GameState {
    /// Creates a fresh run snapshot on `map`'s floor with starting gold and
    /// an empty roster.
    #[must_use]
    pub fn new(map: GameMap) -> Self {
        Self {
            gold: INITIAL_GOLD,
            floor: map.floor,
            map,
            current_node: None,
            player_team: Vec::new(),
            max_team_size: DEFAULT_MAX_TEAM_SIZE,
            unit_ids: UnitIdAllocator::new(),
        }
    }

    /// Gold in the purse.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Map of the current floor.
    #[must_use]
    pub const fn map(&self) -> &GameMap {
        &self.map
    }

    /// Node the party stands on, if any.
    #[must_use]
    pub const fn current_node(&self) -> Option<NodeId> {
        self.current_node
    }

    /// Current floor, starting at one.
    #[must_use]
    pub const fn floor(&self) -> u32 {
        self.floor
    }

    /// Player roster in fighting order.
    #[must_use]
    pub fn player_team(&self) -> &[CombatUnit] {
        &self.player_team
    }

    /// Roster capacity.
    #[must_use]
    pub const fn max_team_size(&self) -> u32 {
        self.max_team_size
    }

    /// Allocator that hands out the next unit instance id.
    #[must_use]
    pub const fn unit_ids(&self) -> UnitIdAllocator {
        self.unit_ids
    }
}

/// Owns the current snapshot and everything needed to derive the next one.
#[derive(Clone, Debug)]
pub struct RunStateManager {
    state: GameState,
    catalog: Catalog,
    generator: MapGenerator,
    rng: ChaCha8Rng,
}

impl RunStateManager {
    /// Starts a run with the standard catalog and map layout.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_parts(Catalog::standard(), MapGenerator::default(), seed)
    }

    /// Starts a run with explicit collaborators.
    #[must_use]
    pub fn with_parts(catalog: Catalog, generator: MapGenerator, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let state = transitions::create_initial_game_state(&generator, &mut rng);
        info!(
            seed,
            nodes = state.map.nodes.len(),
            gold = state.gold,
            "run started"
        );
        Self {
            state,
            catalog,
            generator,
            rng,
        }
    }

    /// Current snapshot.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Unit templates available to this run.
    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Draws the enemy roster for a fight on the current floor.
    ///
    /// Boss fights field a single boss, regular fights one or two enemies.
    pub fn enemy_roster(&mut self, is_boss: bool) -> Result<Vec<CombatUnit>, TransitionError> {
        let mut next = self.state.clone();
        let roster = self.catalog.encounter_roster(
            next.floor,
            is_boss,
            &mut self.rng,
            &mut next.unit_ids,
        )?;
        debug!(floor = next.floor, is_boss, enemies = roster.len(), "enemy roster drawn");
        self.state = next;
        Ok(roster)
    }

    fn transition(&mut self, command: &Command) -> Result<GameState, TransitionError> {
        let state = &self.state;
        match command {
            Command::MoveToNode { node } => transitions::move_to_node(state, *node),
            Command::CompleteNode { node } => transitions::complete_node(state, *node),
            Command::AdvanceFloor => Ok(transitions::advance_to_next_floor(
                state,
                &self.generator,
                &mut self.rng,
            )),
            Command::EarnGold { amount } => Ok(transitions::earn_gold(state, *amount)),
            Command::SpendGold { amount } => transitions::spend_gold(state, *amount),
            Command::RecruitUnit { template, level } => {
                transitions::recruit_unit(state, &self.catalog, template, *level)
            }
            Command::PurchaseUnit { template, cost } => {
                transitions::purchase_unit(state, &self.catalog, template, *cost)
            }
            Command::DismissUnit { unit } => transitions::dismiss_unit(state, *unit),
            Command::UpgradeUnit { unit } => {
                transitions::upgrade_unit(state, &self.catalog, *unit)
            }
            Command::IncreaseMaxTeamSize { amount } => {
                Ok(transitions::increase_max_team_size(state, *amount))
            }
        }
    }
}

/// Applies `command` to the run, replacing the snapshot on success.
///
/// A rejected command leaves the snapshot untouched and pushes no events.
pub fn apply(
    run: &mut RunStateManager,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), TransitionError> {
    let next = match run.transition(&command) {
        Ok(next) => next,
        Err(error) => {
            debug!(?command, %error, "command rejected");
            return Err(error);
        }
    };
    let previous = std::mem::replace(&mut run.state, next);
    let current = &run.state;

    match command {
        Command::MoveToNode { node } => {
            if let Some(entered) = current.map.node(node) {
                out_events.push(Event::NodeEntered {
                    node,
                    node_type: entered.node_type,
                });
            }
        }
        Command::CompleteNode { node } => out_events.push(Event::NodeCompleted {
            node,
            frontier: current.map.frontier(),
        }),
        Command::AdvanceFloor => {
            info!(floor = current.floor, "floor advanced");
            out_events.push(Event::FloorAdvanced {
                floor: current.floor,
            });
        }
        Command::EarnGold { .. } | Command::SpendGold { .. } => {
            push_gold_change(&previous, current, out_events);
        }
        Command::RecruitUnit { template, .. } => push_recruit(current, template, out_events),
        Command::PurchaseUnit { template, .. } => {
            push_gold_change(&previous, current, out_events);
            push_recruit(current, template, out_events);
        }
        Command::DismissUnit { unit } => out_events.push(Event::UnitDismissed { unit }),
        Command::UpgradeUnit { unit } => {
            if let Some(upgraded) = current.player_team.iter().find(|member| member.id == unit) {
                out_events.push(Event::UnitUpgraded {
                    unit,
                    level: upgraded.level,
                });
            }
        }
        Command::IncreaseMaxTeamSize { .. } => out_events.push(Event::TeamCapacityChanged {
            max_team_size: current.max_team_size,
        }),
    }

    Ok(())
}

fn push_gold_change(previous: &GameState, current: &GameState, out_events: &mut Vec<Event>) {
    out_events.push(Event::GoldChanged {
        gold: current.gold,
        delta: i64::from(current.gold) - i64::from(previous.gold),
    });
}

fn push_recruit(current: &GameState, template: TemplateId, out_events: &mut Vec<Event>) {
    if let Some(recruit) = current.player_team.last() {
        out_events.push(Event::UnitRecruited {
            unit: recruit.id,
            template,
        });
    }
}

/// Read-only views derived from a run snapshot.
pub mod query {
    use warband_core::{MapNode, NodeType};

    use super::GameState;

    /// Node the party currently stands on.
    #[must_use]
    pub fn current_node(state: &GameState) -> Option<&MapNode> {
        state.current_node.and_then(|id| state.map.node(id))
    }

    /// Nodes the party may move to next.
    #[must_use]
    pub fn available_nodes(state: &GameState) -> Vec<&MapNode> {
        state.map.nodes.iter().filter(|node| node.available).collect()
    }

    /// Reports whether another unit fits in the roster.
    #[must_use]
    pub fn roster_has_room(state: &GameState) -> bool {
        state.player_team.len() < state.max_team_size as usize
    }

    /// Reports whether a boss node of the current floor has been completed.
    #[must_use]
    pub fn floor_cleared(state: &GameState) -> bool {
        state
            .map
            .nodes
            .iter()
            .any(|node| node.completed && node.node_type == NodeType::Boss)
    }
}
