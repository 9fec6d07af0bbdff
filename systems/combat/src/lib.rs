#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turn-based combat between the player roster and an enemy roster.
//!
//! Each tick the first living unit of each side trades blows. Both attacks
//! use the health and damage values from before the tick, so a pair of
//! units can down each other in the same exchange. Downed units keep their
//! slot in the roster. The battle ends once either side has no living unit
//! left; when both sides fall together the enemy team wins.

mod controller;

pub use controller::{CombatController, DEFAULT_TICK_INTERVAL};

use rand::Rng;
use tracing::{debug, info};
use warband_catalog::Catalog;
use warband_core::{CatalogError, CombatUnit, UnitIdAllocator};

const BATTLE_STARTED: &str = "Battle Started!";
const BOSS_APPROACHES: &str = "The Boss approaches...";
const PLAYER_WINS: &str = "Battle Over - Player Team Wins!";
const ENEMY_WINS: &str = "Battle Over - Enemy Team Wins!";

/// One of the two rosters in a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// The roster controlled by the player.
    Player,
    /// The roster fielded by the encounter.
    Enemy,
}

/// Outcome of a finished battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CombatVerdict {
    /// At least one player unit survived.
    PlayerVictory,
    /// The player roster was wiped out.
    EnemyVictory,
}

impl CombatVerdict {
    /// Side that won the battle.
    #[must_use]
    pub const fn winner(self) -> Side {
        match self {
            Self::PlayerVictory => Side::Player,
            Self::EnemyVictory => Side::Enemy,
        }
    }

    /// Closing log line announcing the verdict.
    #[must_use]
    pub const fn log_line(self) -> &'static str {
        match self {
            Self::PlayerVictory => PLAYER_WINS,
            Self::EnemyVictory => ENEMY_WINS,
        }
    }

    /// Parses a closing log line back into a verdict.
    #[must_use]
    pub fn from_log_line(line: &str) -> Option<Self> {
        match line {
            PLAYER_WINS => Some(Self::PlayerVictory),
            ENEMY_WINS => Some(Self::EnemyVictory),
            _ => None,
        }
    }
}

/// Observable snapshot of a battle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombatState {
    /// Player roster, downed units included.
    pub player_team: Vec<CombatUnit>,
    /// Enemy roster, downed units included.
    pub enemy_team: Vec<CombatUnit>,
    /// Number of exchanges resolved so far.
    pub turn: u32,
    /// Whether ticks still advance the battle.
    pub is_active: bool,
    /// Narration, oldest line first.
    pub logs: Vec<String>,
}

/// A single battle, driven one tick at a time.
#[derive(Clone, Debug)]
pub struct CombatEncounter {
    state: CombatState,
    is_boss: bool,
    started: bool,
}

impl CombatEncounter {
    /// Prepares a battle between two explicit rosters.
    ///
    /// The encounter stays inert until [`CombatEncounter::start`] is called.
    #[must_use]
    pub fn new(player_team: Vec<CombatUnit>, enemy_team: Vec<CombatUnit>, is_boss: bool) -> Self {
        Self {
            state: CombatState {
                player_team,
                enemy_team,
                turn: 0,
                is_active: false,
                logs: Vec::new(),
            },
            is_boss,
            started: false,
        }
    }

    /// Prepares a battle against a roster drawn from `catalog` for `floor`.
    pub fn for_floor<R: Rng + ?Sized>(
        player_team: Vec<CombatUnit>,
        floor: u32,
        is_boss: bool,
        catalog: &Catalog,
        rng: &mut R,
        ids: &mut UnitIdAllocator,
    ) -> Result<Self, CatalogError> {
        let enemy_team = catalog.encounter_roster(floor, is_boss, rng, ids)?;
        Ok(Self::new(player_team, enemy_team, is_boss))
    }

    /// Activates the battle. Calling it again has no effect.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.state.is_active = true;
        let opener = if self.is_boss {
            BOSS_APPROACHES
        } else {
            BATTLE_STARTED
        };
        self.state.logs.push(opener.to_owned());
        debug!(
            players = self.state.player_team.len(),
            enemies = self.state.enemy_team.len(),
            is_boss = self.is_boss,
            "battle started"
        );
    }

    /// Resolves one exchange. Does nothing unless the battle is active.
    pub fn tick(&mut self) {
        if !self.state.is_active {
            return;
        }

        let (Some(player), Some(enemy)) = (
            front_unit(&self.state.player_team),
            front_unit(&self.state.enemy_team),
        ) else {
            self.finish();
            return;
        };

        self.exchange(player, enemy);
        self.state.turn = self.state.turn.saturating_add(1);

        if front_unit(&self.state.player_team).is_none()
            || front_unit(&self.state.enemy_team).is_none()
        {
            self.finish();
        }
    }

    /// Current snapshot.
    #[must_use]
    pub const fn state(&self) -> &CombatState {
        &self.state
    }

    /// Whether the enemy roster is led by a floor boss.
    #[must_use]
    pub const fn is_boss(&self) -> bool {
        self.is_boss
    }

    /// Outcome of the battle, read from its closing log line.
    #[must_use]
    pub fn verdict(&self) -> Option<CombatVerdict> {
        self.state
            .logs
            .last()
            .and_then(|line| CombatVerdict::from_log_line(line))
    }

    /// Consumes the encounter, yielding its final snapshot.
    #[must_use]
    pub fn into_state(self) -> CombatState {
        self.state
    }

    fn exchange(&mut self, player: usize, enemy: usize) {
        let attacker = &self.state.player_team[player];
        let defender = &self.state.enemy_team[enemy];
        let (player_name, player_damage) = (attacker.name.clone(), attacker.damage);
        let (enemy_name, enemy_damage) = (defender.name.clone(), defender.damage);

        let logs = &mut self.state.logs;
        logs.push(format!("{player_name} and {enemy_name} clash!"));
        logs.push(format!(
            "{player_name} deals {player_damage} damage to {enemy_name}"
        ));
        logs.push(format!(
            "{enemy_name} deals {enemy_damage} damage to {player_name}"
        ));

        let enemy_unit = &mut self.state.enemy_team[enemy];
        enemy_unit.current_health = enemy_unit.current_health.saturating_sub(player_damage);
        let enemy_downed = !enemy_unit.is_alive();

        let player_unit = &mut self.state.player_team[player];
        player_unit.current_health = player_unit.current_health.saturating_sub(enemy_damage);
        let player_downed = !player_unit.is_alive();

        if player_downed {
            self.state.logs.push(format!("{player_name} is defeated!"));
        }
        if enemy_downed {
            self.state.logs.push(format!("{enemy_name} is defeated!"));
        }
    }

    fn finish(&mut self) {
        let verdict = if front_unit(&self.state.player_team).is_some() {
            CombatVerdict::PlayerVictory
        } else {
            CombatVerdict::EnemyVictory
        };
        self.state.is_active = false;
        self.state.logs.push(verdict.log_line().to_owned());
        info!(turns = self.state.turn, winner = ?verdict.winner(), "battle over");
    }
}

fn front_unit(team: &[CombatUnit]) -> Option<usize> {
    team.iter().position(CombatUnit::is_alive)
}
