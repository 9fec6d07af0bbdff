use std::{fmt, thread};

use anyhow::{bail, Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use warband_core::{Command, Event, MapNode, NodeType};
use warband_system_combat::{CombatController, CombatEncounter, CombatVerdict};
use warband_system_encounters::{
    claim_treasure, take_team_size_bonus, GambleProgress, PendingGamble, Shop, TreasureChoice,
};
use warband_world::{self as world, query, RunStateManager};

use crate::config::RunConfig;

/// Separates the coin flip stream from the run's own generator.
const ENCOUNTER_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// How an auto-played run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// Every requested floor was cleared.
    Victory,
    /// The party fell on the given floor.
    Defeat {
        /// Floor of the lost battle.
        floor: u32,
    },
}

/// Result of an auto-played run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) outcome: Outcome,
    pub(crate) floors_cleared: u32,
    pub(crate) battles_won: u32,
    pub(crate) gold: u32,
    pub(crate) roster: Vec<String>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::Victory => writeln!(f, "Run complete: every floor cleared!")?,
            Outcome::Defeat { floor } => writeln!(f, "Run over: the party fell on floor {floor}.")?,
        }
        writeln!(f, "Floors cleared: {}", self.floors_cleared)?;
        writeln!(f, "Battles won: {}", self.battles_won)?;
        writeln!(f, "Gold: {}", self.gold)?;
        write!(f, "Roster: {}", self.roster.join(", "))
    }
}

/// Plays a run without player input, narrating to stdout when `verbose`.
pub(crate) struct Autopilot {
    run: RunStateManager,
    config: RunConfig,
    rng: ChaCha8Rng,
    realtime: bool,
    verbose: bool,
    events: Vec<Event>,
}

impl Autopilot {
    pub(crate) fn new(config: RunConfig, realtime: bool, verbose: bool) -> Self {
        Self {
            run: RunStateManager::new(config.seed),
            rng: ChaCha8Rng::seed_from_u64(config.seed ^ ENCOUNTER_SEED_SALT),
            config,
            realtime,
            verbose,
            events: Vec::new(),
        }
    }

    pub(crate) fn play(mut self) -> Result<RunSummary> {
        let team = self.config.starting_team;
        self.say(format!("{}: {}", team.name(), team.description()));
        let mut commands = Vec::new();
        team.recruit(&mut commands);
        self.execute(commands)?;

        let mut floors_cleared = 0;
        let mut battles_won = 0;
        let outcome = loop {
            let floor = self.run.state().floor();
            self.say(format!("== Floor {floor} =="));

            let mut fell = false;
            while !query::floor_cleared(self.run.state()) {
                let node = self.choose_node()?;
                self.execute(vec![Command::MoveToNode { node: node.id }])?;
                let resolved = match node.node_type {
                    NodeType::Combat | NodeType::Boss => {
                        let won = self.fight(node.node_type == NodeType::Boss)?;
                        battles_won += u32::from(won);
                        won
                    }
                    NodeType::Merchant => self.visit_merchant().map(|()| true)?,
                    NodeType::Treasure => self.open_treasure().map(|()| true)?,
                    NodeType::Event => self.face_event().map(|()| true)?,
                    NodeType::Victory => true,
                };
                if !resolved {
                    fell = true;
                    break;
                }
                self.execute(vec![Command::CompleteNode { node: node.id }])?;
            }

            if fell {
                break Outcome::Defeat { floor };
            }
            floors_cleared += 1;
            info!(floor, "floor cleared");
            if floors_cleared >= self.config.floors {
                break Outcome::Victory;
            }
            self.execute(vec![Command::AdvanceFloor])?;
        };

        let state = self.run.state();
        Ok(RunSummary {
            outcome,
            floors_cleared,
            battles_won,
            gold: state.gold(),
            roster: state
                .player_team()
                .iter()
                .map(|unit| format!("{} (level {})", unit.name, unit.level))
                .collect(),
        })
    }

    fn choose_node(&self) -> Result<MapNode> {
        let frontier = query::available_nodes(self.run.state());
        let Some(node) = frontier
            .iter()
            .find(|node| node.node_type != NodeType::Combat)
            .or_else(|| frontier.first())
        else {
            bail!(
                "no available node on floor {} before the boss was beaten",
                self.run.state().floor()
            );
        };
        Ok((*node).clone())
    }

    fn fight(&mut self, is_boss: bool) -> Result<bool> {
        let enemies = self
            .run
            .enemy_roster(is_boss)
            .context("failed to draw the enemy roster")?;
        let encounter =
            CombatEncounter::new(self.run.state().player_team().to_vec(), enemies, is_boss);
        let mut controller = CombatController::with_interval(encounter, self.config.tick_interval());

        let mut printed = 0;
        while !controller.is_finished() {
            let frame = self.config.frame();
            if self.realtime {
                thread::sleep(frame);
            }
            let _ = controller.advance(frame);
            let logs = &controller.encounter().state().logs;
            for line in &logs[printed..] {
                self.say(line.clone());
            }
            printed = logs.len();
        }

        let verdict = controller.encounter().verdict();
        debug!(?verdict, turns = controller.encounter().state().turn, "fight resolved");
        Ok(verdict == Some(CombatVerdict::PlayerVictory))
    }

    fn visit_merchant(&mut self) -> Result<()> {
        let state = self.run.state();
        let shop = Shop::for_floor(self.run.catalog(), state.floor());
        let Some(choice) = shop.suggest(&mut self.rng) else {
            return Ok(());
        };

        let mut commands = Vec::new();
        match shop.purchase(state, &choice.template, &mut commands) {
            Ok(()) => self.say(format!("Hired a {} for {} gold", choice.name, choice.cost)),
            Err(reason) => {
                self.say(format!("The merchant offers a {}, but {reason}", choice.name));
                return Ok(());
            }
        }
        self.execute(commands)
    }

    fn open_treasure(&mut self) -> Result<()> {
        let state = self.run.state();
        let choice = match state.player_team().first() {
            Some(front) if !query::roster_has_room(state) => TreasureChoice::Upgrade(front.id),
            _ => TreasureChoice::Gold,
        };
        let mut commands = Vec::new();
        claim_treasure(state, choice, &mut commands).context("failed to claim the treasure")?;
        self.say(format!("Treasure found: {choice:?}"));
        self.execute(commands)
    }

    fn face_event(&mut self) -> Result<()> {
        let state = self.run.state();
        let mut commands = Vec::new();
        let gamble = if query::roster_has_room(state) {
            PendingGamble::place(state).ok()
        } else {
            None
        };

        match gamble {
            Some(mut gamble) => {
                self.say("A stranger offers a coin flip.".to_owned());
                loop {
                    let frame = self.config.frame();
                    if self.realtime {
                        thread::sleep(frame);
                    }
                    match gamble.advance(frame, &mut self.rng, &mut commands) {
                        GambleProgress::Pending => continue,
                        GambleProgress::Resolved(outcome) => {
                            self.say(format!("The coin lands: {outcome:?}"));
                            break;
                        }
                        GambleProgress::Cancelled => break,
                    }
                }
            }
            None => {
                self.say("A veteran offers to join the cause: +1 team size.".to_owned());
                take_team_size_bonus(&mut commands);
            }
        }
        self.execute(commands)
    }

    fn execute(&mut self, commands: Vec<Command>) -> Result<()> {
        for command in commands {
            world::apply(&mut self.run, command.clone(), &mut self.events)
                .with_context(|| format!("run rejected {command:?}"))?;
        }
        for event in self.events.drain(..) {
            debug!(?event, "run event");
        }
        Ok(())
    }

    fn say(&self, line: String) {
        if self.verbose {
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(seed: u64) -> RunConfig {
        RunConfig {
            seed,
            floors: 2,
            ..RunConfig::default()
        }
    }

    #[test]
    fn same_seed_plays_the_same_run() {
        let first = Autopilot::new(quick(11), false, false)
            .play()
            .expect("run completes");
        let second = Autopilot::new(quick(11), false, false)
            .play()
            .expect("run completes");
        assert_eq!(first, second);
    }

    #[test]
    fn runs_end_in_victory_or_a_defeat_on_a_played_floor() {
        for seed in 0..8 {
            let summary = Autopilot::new(quick(seed), false, false)
                .play()
                .expect("run completes");
            match summary.outcome {
                Outcome::Victory => assert_eq!(summary.floors_cleared, 2),
                Outcome::Defeat { floor } => assert_eq!(floor, summary.floors_cleared + 1),
            }
            assert!(!summary.roster.is_empty());
        }
    }
}
