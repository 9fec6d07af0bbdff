#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Static unit templates and the factories that turn them into roster members.
//!
//! Heroes are recruitable by the player, enemies populate encounters. Both
//! share the same level scaling: an instance at level `n` carries the
//! template's base stats plus `n - 1` times each defined per-level delta.

mod data;

use rand::{seq::SliceRandom, Rng};
use warband_core::{CatalogError, CombatUnit, TemplateId, UnitIdAllocator, UnitTemplate};

/// Template used for every floor boss.
pub const BOSS_TEMPLATE: &str = "orc_chief";

/// Largest number of regular enemies fielded in one fight.
pub const MAX_ENEMIES_PER_ENCOUNTER: usize = 2;

/// Immutable registry of hero and enemy templates.
#[derive(Clone, Debug)]
pub struct Catalog {
    heroes: Vec<UnitTemplate>,
    enemies: Vec<UnitTemplate>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl Catalog {
    /// Catalog shipped with the game.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(data::heroes(), data::enemies())
    }

    /// Builds a catalog from explicit template lists.
    #[must_use]
    pub fn new(heroes: Vec<UnitTemplate>, enemies: Vec<UnitTemplate>) -> Self {
        Self { heroes, enemies }
    }

    /// Recruitable templates in registration order.
    #[must_use]
    pub fn heroes(&self) -> &[UnitTemplate] {
        &self.heroes
    }

    /// Enemy templates in registration order.
    #[must_use]
    pub fn enemies(&self) -> &[UnitTemplate] {
        &self.enemies
    }

    /// Looks up a hero template.
    pub fn hero(&self, id: &TemplateId) -> Result<&UnitTemplate, CatalogError> {
        find(&self.heroes, id)
    }

    /// Looks up an enemy template.
    pub fn enemy(&self, id: &TemplateId) -> Result<&UnitTemplate, CatalogError> {
        find(&self.enemies, id)
    }

    /// Heroes that the merchant may offer on `floor`.
    pub fn shop_listings(&self, floor: u32) -> impl Iterator<Item = &UnitTemplate> {
        self.heroes
            .iter()
            .filter(move |template| template.shop.is_some() && template.unlocked_on(floor))
    }

    /// Instantiates a hero at `level`.
    pub fn create_unit(
        &self,
        template: &TemplateId,
        level: u32,
        ids: &mut UnitIdAllocator,
    ) -> Result<CombatUnit, CatalogError> {
        let template = self.hero(template)?;
        Ok(instantiate(template, level, ids))
    }

    /// Instantiates an enemy at `level`.
    pub fn create_enemy_unit(
        &self,
        template: &TemplateId,
        level: u32,
        ids: &mut UnitIdAllocator,
    ) -> Result<CombatUnit, CatalogError> {
        let template = self.enemy(template)?;
        Ok(instantiate(template, level, ids))
    }

    /// Draws `count` enemies unlocked on `floor`, all at [`enemy_level`].
    ///
    /// Returns an empty roster when no enemy is unlocked.
    pub fn random_enemies<R: Rng + ?Sized>(
        &self,
        floor: u32,
        count: usize,
        rng: &mut R,
        ids: &mut UnitIdAllocator,
    ) -> Vec<CombatUnit> {
        let pool: Vec<&UnitTemplate> = self
            .enemies
            .iter()
            .filter(|template| template.unlocked_on(floor))
            .collect();
        let level = enemy_level(floor);

        (0..count)
            .filter_map(|_| pool.choose(rng))
            .map(|template| instantiate(template, level, ids))
            .collect()
    }

    /// Creates the floor boss: [`BOSS_TEMPLATE`] at [`boss_level`] with
    /// half again as much health and a fifth more damage.
    pub fn boss_enemy(
        &self,
        floor: u32,
        ids: &mut UnitIdAllocator,
    ) -> Result<CombatUnit, CatalogError> {
        let template = self.enemy(&TemplateId::new(BOSS_TEMPLATE))?;
        let mut boss = instantiate(template, boss_level(floor), ids);
        boss.max_health = boss.max_health.saturating_mul(3) / 2;
        boss.current_health = boss.max_health;
        boss.damage = boss.damage.saturating_mul(6) / 5;
        boss.name = format!("{} (Boss)", boss.name);
        Ok(boss)
    }

    /// Enemy roster for one fight on `floor`: the boss alone, or between one
    /// and [`MAX_ENEMIES_PER_ENCOUNTER`] random enemies.
    pub fn encounter_roster<R: Rng + ?Sized>(
        &self,
        floor: u32,
        is_boss: bool,
        rng: &mut R,
        ids: &mut UnitIdAllocator,
    ) -> Result<Vec<CombatUnit>, CatalogError> {
        if is_boss {
            return Ok(vec![self.boss_enemy(floor, ids)?]);
        }
        let count = rng.gen_range(1..=MAX_ENEMIES_PER_ENCOUNTER);
        Ok(self.random_enemies(floor, count, rng, ids))
    }
}

/// Level of regular enemies on `floor`: seventy percent of the floor, at least one.
#[must_use]
pub fn enemy_level(floor: u32) -> u32 {
    (floor.saturating_mul(7) / 10).max(1)
}

/// Level of the boss on `floor`: eighty percent of the floor, at least one.
#[must_use]
pub fn boss_level(floor: u32) -> u32 {
    (floor.saturating_mul(8) / 10).max(1)
}

/// Returns `unit` raised by one level using `template` growth.
///
/// Current health grows by the same amount as max health, so damage taken
/// before the upgrade is kept.
#[must_use]
pub fn upgrade_unit(unit: &CombatUnit, template: &UnitTemplate) -> CombatUnit {
    let growth = template.stats_per_level;
    let health_gain = growth.max_health.unwrap_or(0);
    CombatUnit {
        level: unit.level.saturating_add(1),
        max_health: unit.max_health.saturating_add(health_gain),
        current_health: unit.current_health.saturating_add(health_gain),
        damage: unit.damage.saturating_add(growth.damage.unwrap_or(0)),
        ..unit.clone()
    }
}

fn find<'a>(
    templates: &'a [UnitTemplate],
    id: &TemplateId,
) -> Result<&'a UnitTemplate, CatalogError> {
    templates
        .iter()
        .find(|template| &template.id == id)
        .ok_or_else(|| CatalogError::UnknownTemplate(id.clone()))
}

fn instantiate(template: &UnitTemplate, level: u32, ids: &mut UnitIdAllocator) -> CombatUnit {
    let level = level.max(1);
    let stats = template.stats_at(level);
    CombatUnit {
        id: ids.allocate(),
        template_id: template.id.clone(),
        name: template.name.clone(),
        level,
        max_health: stats.max_health,
        damage: stats.damage,
        current_health: stats.max_health,
    }
}
