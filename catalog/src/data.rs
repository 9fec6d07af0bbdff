use warband_core::{Rarity, ShopData, StatGrowth, TemplateId, UnitStats, UnitTemplate};

#[allow(clippy::too_many_arguments)]
fn template(
    id: &str,
    name: &str,
    description: &str,
    rarity: Rarity,
    base: (u32, u32),
    growth: (u32, u32),
    shop: Option<(u32, u32)>,
    min_floor: Option<u32>,
) -> UnitTemplate {
    UnitTemplate {
        id: TemplateId::new(id),
        name: name.to_owned(),
        description: description.to_owned(),
        rarity,
        base_stats: UnitStats::new(base.0, base.1),
        stats_per_level: StatGrowth {
            max_health: Some(growth.0),
            damage: Some(growth.1),
        },
        shop: shop.map(|(cost, weight)| ShopData { cost, weight }),
        min_floor,
    }
}

pub(crate) fn heroes() -> Vec<UnitTemplate> {
    vec![
        template(
            "knight",
            "Knight",
            "A stalwart defender with high health and moderate damage.",
            Rarity::Common,
            (100, 20),
            (20, 4),
            Some((100, 100)),
            None,
        ),
        template(
            "archer",
            "Archer",
            "A ranged attacker with high damage but low health.",
            Rarity::Common,
            (70, 30),
            (12, 6),
            Some((120, 100)),
            None,
        ),
        template(
            "cleric",
            "Cleric",
            "A balanced unit with moderate health and damage.",
            Rarity::Uncommon,
            (80, 15),
            (15, 3),
            Some((150, 75)),
            Some(2),
        ),
        template(
            "berserker",
            "Berserker",
            "A powerful warrior with high damage output.",
            Rarity::Rare,
            (85, 25),
            (15, 5),
            Some((180, 50)),
            Some(2),
        ),
    ]
}

pub(crate) fn enemies() -> Vec<UnitTemplate> {
    vec![
        template(
            "goblin",
            "Goblin",
            "A weak but numerous enemy.",
            Rarity::Common,
            (40, 10),
            (10, 3),
            None,
            None,
        ),
        template(
            "orc",
            "Orc",
            "A brutish enemy with moderate strength.",
            Rarity::Common,
            (60, 15),
            (15, 4),
            None,
            None,
        ),
        template(
            "ogre",
            "Ogre",
            "A tough enemy with high health.",
            Rarity::Uncommon,
            (100, 12),
            (25, 3),
            None,
            Some(2),
        ),
        template(
            "orc_chief",
            "Orc Chief",
            "A powerful leader of the orcs.",
            Rarity::Rare,
            (120, 20),
            (30, 5),
            None,
            Some(2),
        ),
    ]
}
