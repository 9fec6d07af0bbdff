use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use warband_core::{Command, TemplateId};
use warband_system_encounters::{
    claim_treasure, preview_upgrade, take_team_size_bonus, EncounterError, GambleOutcome,
    GambleProgress, PendingGamble, Shop, StartingTeam, TreasureChoice, GAMBLE_DELAY,
};
use warband_world::{self as world, RunStateManager, INITIAL_GOLD};

fn apply_all(run: &mut RunStateManager, commands: Vec<Command>) {
    let mut events = Vec::new();
    for command in commands {
        world::apply(run, command, &mut events).expect("encounter commands are pre-validated");
    }
}

fn with_team(seed: u64, team: StartingTeam) -> RunStateManager {
    let mut run = RunStateManager::new(seed);
    let mut commands = Vec::new();
    team.recruit(&mut commands);
    apply_all(&mut run, commands);
    run
}

#[test]
fn starting_teams_field_their_heroes() {
    for (team, template) in [
        (StartingTeam::Balanced, "knight"),
        (StartingTeam::Aggressive, "berserker"),
        (StartingTeam::Defensive, "archer"),
    ] {
        let run = with_team(1, team);
        let roster = run.state().player_team();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].template_id.as_str(), template);
        assert_eq!(roster[0].level, 1);
        assert_eq!(roster[0].current_health, roster[0].max_health);
    }
}

#[test]
fn shop_refuses_what_the_purse_cannot_cover() {
    let mut run = RunStateManager::new(2);
    let shop = Shop::for_floor(run.catalog(), run.state().floor());
    let mut commands = Vec::new();

    let archer = shop.purchase(run.state(), &TemplateId::from("archer"), &mut commands);
    assert_eq!(
        archer,
        Err(EncounterError::InsufficientGold {
            required: 120,
            available: INITIAL_GOLD,
        })
    );
    assert!(commands.is_empty());

    shop.purchase(run.state(), &TemplateId::from("knight"), &mut commands)
        .expect("knight costs exactly the starting purse");
    apply_all(&mut run, commands);
    assert_eq!(run.state().gold(), 0);
    assert_eq!(run.state().player_team().len(), 1);
    assert_eq!(shop.affordable(run.state()).count(), 0);
}

#[test]
fn shop_refuses_when_the_roster_is_full() {
    let mut run = with_team(3, StartingTeam::Balanced);
    apply_all(&mut run, vec![Command::EarnGold { amount: 1_000 }]);
    let shop = Shop::for_floor(run.catalog(), 1);

    for _ in 0..2 {
        let mut commands = Vec::new();
        shop.purchase(run.state(), &TemplateId::from("archer"), &mut commands)
            .expect("room and gold left");
        apply_all(&mut run, commands);
    }

    let mut commands = Vec::new();
    assert_eq!(
        shop.purchase(run.state(), &TemplateId::from("knight"), &mut commands),
        Err(EncounterError::RosterFull { capacity: 3 })
    );
    assert_eq!(
        shop.purchase(run.state(), &TemplateId::from("cleric"), &mut commands),
        Err(EncounterError::NotForSale(TemplateId::from("cleric")))
    );

    let dismissed = run.state().player_team()[0].id;
    shop.dismiss(run.state(), dismissed, &mut commands)
        .expect("unit is in the roster");
    apply_all(&mut run, commands);
    assert_eq!(run.state().player_team().len(), 2);
    assert!(run
        .state()
        .player_team()
        .iter()
        .all(|unit| unit.id != dismissed));
}

#[test]
fn treasure_grants_gold_or_a_level() {
    let mut run = with_team(4, StartingTeam::Defensive);
    let mut commands = Vec::new();
    claim_treasure(run.state(), TreasureChoice::Gold, &mut commands).expect("gold is free");
    apply_all(&mut run, commands);
    assert_eq!(run.state().gold(), INITIAL_GOLD + 200);

    let archer = run.state().player_team()[0].id;
    let preview = preview_upgrade(run.state(), run.catalog(), archer).expect("archer exists");
    let mut commands = Vec::new();
    claim_treasure(run.state(), TreasureChoice::Upgrade(archer), &mut commands)
        .expect("archer exists");
    apply_all(&mut run, commands);
    assert_eq!(run.state().player_team()[0], preview);
    assert_eq!(preview.level, 2);
    assert_eq!(preview.damage, 36);
}

#[test]
fn recruiting_offer_grows_the_roster_capacity() {
    let mut run = RunStateManager::new(5);
    let before = run.state().max_team_size();
    let mut commands = Vec::new();
    take_team_size_bonus(&mut commands);
    apply_all(&mut run, commands);
    assert_eq!(run.state().max_team_size(), before + 1);
}

#[test]
fn gamble_needs_the_full_stake() {
    let mut run = RunStateManager::new(6);
    apply_all(&mut run, vec![Command::SpendGold { amount: 1 }]);
    assert!(matches!(
        PendingGamble::place(run.state()),
        Err(EncounterError::InsufficientGold { required: 100, .. })
    ));
}

#[test]
fn gamble_outcomes_move_the_purse() {
    let mut seen = Vec::new();
    for seed in 0..32 {
        let mut run = RunStateManager::new(seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut gamble = PendingGamble::place(run.state()).expect("stake covered");
        let mut commands = Vec::new();

        let progress = gamble.advance(GAMBLE_DELAY, &mut rng, &mut commands);
        let GambleProgress::Resolved(outcome) = progress else {
            panic!("coin should land after the full delay, got {progress:?}");
        };
        apply_all(&mut run, commands);

        let expected = i64::from(INITIAL_GOLD) + outcome.gold_change();
        assert_eq!(i64::from(run.state().gold()), expected);
        seen.push(outcome);
    }
    assert!(seen.contains(&GambleOutcome::Won));
    assert!(seen.contains(&GambleOutcome::Lost));
}

#[test]
fn cancelling_mid_flip_keeps_the_purse() {
    let run = RunStateManager::new(7);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut gamble = PendingGamble::place(run.state()).expect("stake covered");
    let mut commands = Vec::new();

    let half = GAMBLE_DELAY / 2;
    assert_eq!(
        gamble.advance(half, &mut rng, &mut commands),
        GambleProgress::Pending
    );
    gamble.cancel();
    assert_eq!(
        gamble.advance(half, &mut rng, &mut commands),
        GambleProgress::Cancelled
    );
    assert!(commands.is_empty());
    assert_eq!(gamble.remaining(), half);
}

#[derive(Clone, Debug)]
enum ShopVisit {
    Purchase(usize),
    Dismiss(usize),
    Earn(u32),
    Grow,
}

fn shop_visit() -> impl Strategy<Value = ShopVisit> {
    prop_oneof![
        4 => (0_usize..8).prop_map(ShopVisit::Purchase),
        1 => (0_usize..8).prop_map(ShopVisit::Dismiss),
        2 => (0_u32..300).prop_map(ShopVisit::Earn),
        1 => Just(ShopVisit::Grow),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn shop_commands_are_always_accepted(seed in any::<u64>(), visits in prop::collection::vec(shop_visit(), 1..40)) {
        let mut run = RunStateManager::new(seed);
        let shop = Shop::for_floor(run.catalog(), 2);
        let mut events = Vec::new();

        for visit in visits {
            let mut commands = Vec::new();
            let emitted = match visit {
                ShopVisit::Purchase(index) => {
                    let listings = shop.listings();
                    let template = listings[index % listings.len()].template.clone();
                    shop.purchase(run.state(), &template, &mut commands)
                }
                ShopVisit::Dismiss(index) => {
                    let team = run.state().player_team();
                    if team.is_empty() {
                        continue;
                    }
                    let unit = team[index % team.len()].id;
                    shop.dismiss(run.state(), unit, &mut commands)
                }
                ShopVisit::Earn(amount) => {
                    commands.push(Command::EarnGold { amount });
                    Ok(())
                }
                ShopVisit::Grow => {
                    take_team_size_bonus(&mut commands);
                    Ok(())
                }
            };
            if emitted.is_err() {
                prop_assert!(commands.is_empty());
            }

            for command in commands {
                let applied = world::apply(&mut run, command, &mut events);
                prop_assert!(applied.is_ok(), "{:?}", applied);
            }
            let state = run.state();
            prop_assert!(state.player_team().len() <= state.max_team_size() as usize);
        }
    }
}
