#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Warband run engine.
//!
//! This crate defines the data that flows between the authoritative run state,
//! the pure systems, and adapters. Adapters and encounter systems submit
//! [`Command`] values describing desired mutations, the run state manager in
//! `warband-world` executes them through its `apply` entry point, and then
//! broadcasts [`Event`] values describing what changed. Map generation and the
//! combat resolver exchange the plain snapshots declared here.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier assigned to a map node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new node identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Unique identifier assigned to a single unit instance.
///
/// Distinct from [`TemplateId`]: two knights share a template but never an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// Hands out monotonically increasing [`UnitId`] values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitIdAllocator {
    next: u32,
}

impl UnitIdAllocator {
    /// Creates an allocator whose first identifier is zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Creates an allocator whose first identifier is `first`.
    #[must_use]
    pub const fn starting_at(first: u32) -> Self {
        Self { next: first }
    }

    /// Returns the next free identifier and advances the allocator.
    pub fn allocate(&mut self) -> UnitId {
        let id = UnitId::new(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Identifier that the next call to [`UnitIdAllocator::allocate`] yields.
    #[must_use]
    pub const fn peek(&self) -> UnitId {
        UnitId::new(self.next)
    }
}

/// Identifier of a static unit template, such as `knight` or `orc_chief`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateId(String);

impl TemplateId {
    /// Wraps the provided template key.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the template key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Encounter categories that a map node can host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Regular fight against one or two enemies.
    Combat,
    /// Shop where units can be recruited or dismissed.
    Merchant,
    /// Treasure room offering gold or a unit upgrade.
    Treasure,
    /// Mystery event with a gamble or a roster expansion.
    Event,
    /// Floor boss; every node of the final layer carries this type.
    Boss,
    /// Terminal marker for a finished run. Never produced by the generator.
    Victory,
}

impl NodeType {
    /// Reports whether entering the node starts a fight.
    #[must_use]
    pub const fn is_fight(self) -> bool {
        matches!(self, Self::Combat | Self::Boss)
    }

    /// Human readable label used by adapters.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Combat => "Combat Encounter",
            Self::Merchant => "Merchant",
            Self::Treasure => "Treasure Room",
            Self::Event => "Mystery Event",
            Self::Boss => "Boss Battle",
            Self::Victory => "Victory",
        }
    }
}

/// Position of a node on the map canvas, in map units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    /// Horizontal coordinate; grows with the layer index.
    pub x: f64,
    /// Vertical coordinate within the layer.
    pub y: f64,
}

impl MapPoint {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A single encounter location on the floor map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapNode {
    /// Identifier of the node, unique within its map.
    pub id: NodeId,
    /// Encounter hosted by the node.
    pub node_type: NodeType,
    /// Layer the node was generated in; layer zero is the floor entry.
    pub layer: u32,
    /// Canvas position.
    pub position: MapPoint,
    /// Outbound edges in insertion order.
    pub connections: Vec<NodeId>,
    /// Set once the encounter has been resolved.
    pub completed: bool,
    /// Set while the node belongs to the frontier of legal moves.
    pub available: bool,
}

impl MapNode {
    /// Reports whether the node has an outbound edge to `target`.
    #[must_use]
    pub fn connects_to(&self, target: NodeId) -> bool {
        self.connections.contains(&target)
    }
}

/// Layered directed acyclic graph of encounters for a single floor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameMap {
    /// Floor the map was generated for.
    pub floor: u32,
    /// Nodes ordered by layer, then by vertical slot.
    pub nodes: Vec<MapNode>,
    /// First node of layer zero.
    pub start_node_id: NodeId,
    /// Every node of the final layer.
    pub end_node_ids: Vec<NodeId>,
}

impl GameMap {
    /// Looks up a node by identifier.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&MapNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Number of layers present in the map.
    #[must_use]
    pub fn layer_count(&self) -> u32 {
        self.nodes
            .iter()
            .map(|node| node.layer + 1)
            .max()
            .unwrap_or(0)
    }

    /// Iterator over the nodes of a single layer in generation order.
    pub fn layer(&self, layer: u32) -> impl Iterator<Item = &MapNode> {
        self.nodes.iter().filter(move |node| node.layer == layer)
    }

    /// Identifiers of the nodes currently flagged available.
    #[must_use]
    pub fn frontier(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|node| node.available)
            .map(|node| node.id)
            .collect()
    }

    /// Reports whether any node has an edge pointing at `target`.
    #[must_use]
    pub fn has_incoming(&self, target: NodeId) -> bool {
        self.nodes.iter().any(|node| node.connects_to(target))
    }

    /// Collects every node reachable from layer zero by following edges.
    ///
    /// Layer-zero nodes are part of the result.
    #[must_use]
    pub fn reachable_from_entry(&self) -> BTreeSet<NodeId> {
        let mut reachable = BTreeSet::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        for node in self.layer(0) {
            if reachable.insert(node.id) {
                queue.push_back(node.id);
            }
        }

        while let Some(current) = queue.pop_front() {
            let Some(node) = self.node(current) else {
                continue;
            };
            for target in &node.connections {
                if reachable.insert(*target) {
                    queue.push_back(*target);
                }
            }
        }

        reachable
    }
}

/// Rarity tier of a unit template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Lowest tier.
    Common,
    /// Second tier.
    Uncommon,
    /// Third tier.
    Rare,
    /// Fourth tier.
    Epic,
    /// Highest tier.
    Legendary,
}

/// Combat statistics shared by templates and unit instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Health pool when fully healed.
    pub max_health: u32,
    /// Damage dealt per attack.
    pub damage: u32,
}

impl UnitStats {
    /// Creates a new stat block.
    #[must_use]
    pub const fn new(max_health: u32, damage: u32) -> Self {
        Self { max_health, damage }
    }

    /// Applies `levels` worth of `growth` on top of these stats.
    ///
    /// Stats without a growth entry stay unchanged.
    #[must_use]
    pub fn grown_by(self, growth: StatGrowth, levels: u32) -> Self {
        let delta = |per_level: Option<u32>| per_level.unwrap_or(0).saturating_mul(levels);
        Self {
            max_health: self.max_health.saturating_add(delta(growth.max_health)),
            damage: self.damage.saturating_add(delta(growth.damage)),
        }
    }
}

/// Per-level stat deltas. Missing entries do not grow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatGrowth {
    /// Max health gained per level.
    pub max_health: Option<u32>,
    /// Damage gained per level.
    pub damage: Option<u32>,
}

/// Shop metadata for recruitable templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopData {
    /// Gold price of a level one recruit.
    pub cost: u32,
    /// Relative chance of being offered.
    pub weight: u32,
}

/// Static definition from which leveled unit instances are derived.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTemplate {
    /// Template key.
    pub id: TemplateId,
    /// Display name.
    pub name: String,
    /// Flavour text.
    pub description: String,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Level one stats.
    pub base_stats: UnitStats,
    /// Stats gained for every level above one.
    pub stats_per_level: StatGrowth,
    /// Present for templates that can be bought.
    pub shop: Option<ShopData>,
    /// First floor on which the template may appear.
    pub min_floor: Option<u32>,
}

impl UnitTemplate {
    /// Stats of an instance at `level`; levels below one are treated as one.
    #[must_use]
    pub fn stats_at(&self, level: u32) -> UnitStats {
        self.base_stats.grown_by(self.stats_per_level, level.max(1) - 1)
    }

    /// Reports whether the template is unlocked on `floor`.
    #[must_use]
    pub fn unlocked_on(&self, floor: u32) -> bool {
        self.min_floor.map_or(true, |min_floor| min_floor <= floor)
    }
}

/// Runtime unit instance as it appears in a roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatUnit {
    /// Instance identifier.
    pub id: UnitId,
    /// Template the unit was derived from.
    pub template_id: TemplateId,
    /// Display name.
    pub name: String,
    /// Current level, at least one.
    pub level: u32,
    /// Health pool when fully healed.
    pub max_health: u32,
    /// Damage dealt per attack.
    pub damage: u32,
    /// Remaining health, never above `max_health`.
    pub current_health: u32,
}

impl CombatUnit {
    /// Reports whether the unit can still act.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current_health > 0
    }

    /// Current stats of the unit.
    #[must_use]
    pub const fn stats(&self) -> UnitStats {
        UnitStats::new(self.max_health, self.damage)
    }
}

/// Commands that express all permissible run state mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Moves the party onto an available node.
    MoveToNode {
        /// Node to enter.
        node: NodeId,
    },
    /// Marks a node resolved and moves the frontier past it.
    CompleteNode {
        /// Node that was resolved.
        node: NodeId,
    },
    /// Regenerates the map for the next floor.
    AdvanceFloor,
    /// Adds gold to the purse.
    EarnGold {
        /// Gold gained.
        amount: u32,
    },
    /// Removes gold from the purse; rejected when the purse is too small.
    SpendGold {
        /// Gold spent.
        amount: u32,
    },
    /// Adds a fresh unit to the roster at no cost.
    RecruitUnit {
        /// Template to instantiate.
        template: TemplateId,
        /// Level of the new unit.
        level: u32,
    },
    /// Pays for and recruits a level one unit in a single step.
    PurchaseUnit {
        /// Template to instantiate.
        template: TemplateId,
        /// Gold price.
        cost: u32,
    },
    /// Removes a unit from the roster.
    DismissUnit {
        /// Unit to remove.
        unit: UnitId,
    },
    /// Raises a unit by one level using its template growth.
    UpgradeUnit {
        /// Unit to upgrade.
        unit: UnitId,
    },
    /// Grows the roster capacity.
    IncreaseMaxTeamSize {
        /// Additional roster slots.
        amount: u32,
    },
}

/// Events broadcast by the run state manager after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The party stepped onto a node.
    NodeEntered {
        /// Node that became current.
        node: NodeId,
        /// Encounter hosted by the node.
        node_type: NodeType,
    },
    /// A node was resolved and the frontier moved.
    NodeCompleted {
        /// Node that was resolved.
        node: NodeId,
        /// Nodes that became available.
        frontier: Vec<NodeId>,
    },
    /// A new floor map was generated.
    FloorAdvanced {
        /// Floor that became active.
        floor: u32,
    },
    /// The purse changed.
    GoldChanged {
        /// Purse after the change.
        gold: u32,
        /// Signed change applied.
        delta: i64,
    },
    /// A unit joined the roster.
    UnitRecruited {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Template the unit was derived from.
        template: TemplateId,
    },
    /// A unit left the roster.
    UnitDismissed {
        /// Unit that was removed.
        unit: UnitId,
    },
    /// A unit gained a level.
    UnitUpgraded {
        /// Unit that was upgraded.
        unit: UnitId,
        /// Level after the upgrade.
        level: u32,
    },
    /// Roster capacity changed.
    TeamCapacityChanged {
        /// Capacity after the change.
        max_team_size: u32,
    },
}

/// Reasons a template lookup may fail.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// No template is registered under the identifier.
    #[error("unknown unit template: {0}")]
    UnknownTemplate(TemplateId),
}

/// Reasons a run state transition may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The node does not exist on the current map.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    /// The node exists but is not part of the frontier.
    #[error("cannot move to unavailable node {0}")]
    NodeUnavailable(NodeId),
    /// The unit is not part of the roster.
    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),
    /// The purse cannot cover the requested amount.
    #[error("insufficient gold: required {required}, available {available}")]
    InsufficientGold {
        /// Gold requested.
        required: u32,
        /// Gold held.
        available: u32,
    },
    /// The roster already holds the maximum number of units.
    #[error("roster is full ({capacity} units)")]
    RosterFull {
        /// Maximum roster size.
        capacity: u32,
    },
    /// A referenced template does not exist.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u32, layer: u32, connections: &[u32]) -> MapNode {
        MapNode {
            id: NodeId::new(id),
            node_type: NodeType::Combat,
            layer,
            position: MapPoint::new(f64::from(layer) * 100.0, f64::from(id) * 10.0),
            connections: connections.iter().copied().map(NodeId::new).collect(),
            completed: false,
            available: layer == 0,
        }
    }

    fn sample_map() -> GameMap {
        GameMap {
            floor: 1,
            nodes: vec![
                node(0, 0, &[2]),
                node(1, 0, &[2]),
                node(2, 1, &[4]),
                node(3, 1, &[4]),
                node(4, 2, &[]),
            ],
            start_node_id: NodeId::new(0),
            end_node_ids: vec![NodeId::new(4)],
        }
    }

    #[test]
    fn reachability_follows_edges_from_every_entry() {
        let map = sample_map();
        let reachable = map.reachable_from_entry();
        let expected: BTreeSet<NodeId> = [0, 1, 2, 4].into_iter().map(NodeId::new).collect();
        assert_eq!(reachable, expected);
        assert!(!map.has_incoming(NodeId::new(3)));
        assert_eq!(map.layer_count(), 3);
        assert_eq!(map.frontier(), vec![NodeId::new(0), NodeId::new(1)]);
    }

    #[test]
    fn stats_grow_only_for_defined_entries() {
        let base = UnitStats::new(100, 20);
        let growth = StatGrowth {
            max_health: Some(20),
            damage: None,
        };
        assert_eq!(base.grown_by(growth, 0), base);
        assert_eq!(base.grown_by(growth, 2), UnitStats::new(140, 20));
    }

    #[test]
    fn allocator_hands_out_distinct_ids() {
        let mut ids = UnitIdAllocator::starting_at(7);
        let first = ids.allocate();
        let second = ids.allocate();
        assert_eq!(first, UnitId::new(7));
        assert_eq!(second, UnitId::new(8));
        assert_eq!(ids.peek(), UnitId::new(9));
    }

    #[test]
    fn identifiers_render_with_prefixes() {
        assert_eq!(NodeId::new(3).to_string(), "node-3");
        assert_eq!(UnitId::new(12).to_string(), "unit-12");
        assert_eq!(TemplateId::from("knight").to_string(), "knight");
    }

    #[test]
    fn game_map_round_trips_through_bincode() {
        let map = sample_map();
        let bytes = bincode::serialize(&map).expect("serialize");
        let restored: GameMap = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, map);
    }

    #[test]
    fn transition_errors_render_readable_messages() {
        let error = TransitionError::NodeUnavailable(NodeId::new(5));
        assert_eq!(error.to_string(), "cannot move to unavailable node node-5");
        let error: TransitionError =
            CatalogError::UnknownTemplate(TemplateId::from("dragon")).into();
        assert_eq!(error.to_string(), "unknown unit template: dragon");
    }
}
