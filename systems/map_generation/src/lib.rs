#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural floor map generation.
//!
//! A floor is a layered directed acyclic graph. Nodes are laid out left to
//! right by layer, edges only point forward, and a greedy pass keeps edge
//! crossings low. Two repair passes then guarantee that every node past the
//! entry layer has an incoming edge and that every boss node can be reached
//! from the entry layer.

pub mod geometry;

use std::collections::VecDeque;

use rand::Rng;
use tracing::debug;
use warband_core::{GameMap, MapNode, MapPoint, NodeId, NodeType};

use crate::geometry::{count_crossings, edge_segments, total_crossings, Segment};

/// Number of layers in a floor, boss layer included.
pub const NUM_LAYERS: u32 = 5;
/// Fewest nodes generated in a layer.
pub const MIN_NODES_PER_LAYER: u32 = 2;
/// Most nodes generated in a layer.
pub const MAX_NODES_PER_LAYER: u32 = 3;
/// Width of the map canvas.
pub const MAP_WIDTH: f64 = 800.0;
/// Height of the map canvas.
pub const MAP_HEIGHT: f64 = 600.0;
/// Margin kept between nodes and the top and bottom edges of the canvas.
pub const MIN_NODE_DISTANCE: f64 = 120.0;

const NODE_TYPE_POOL: [NodeType; 6] = [
    NodeType::Combat,
    NodeType::Combat,
    NodeType::Combat,
    NodeType::Merchant,
    NodeType::Treasure,
    NodeType::Event,
];

/// Tuning knobs for the generator.
#[derive(Clone, Debug, PartialEq)]
pub struct MapConfig {
    /// Number of layers, boss layer included. At least two.
    pub layers: u32,
    /// Fewest nodes per layer. At least one.
    pub min_nodes_per_layer: u32,
    /// Most nodes per layer.
    pub max_nodes_per_layer: u32,
    /// Canvas width; layers are spread evenly across it.
    pub width: f64,
    /// Canvas height; nodes of a layer are spread evenly across it.
    pub height: f64,
    /// Margin kept from the top and bottom edges.
    pub min_node_distance: f64,
    /// Vertical jitter as a fraction of the in-layer spacing, split evenly
    /// above and below the slot.
    pub jitter: f64,
    /// Probability that a node gets two outbound edges instead of one.
    pub double_connection_chance: f64,
    /// Probability that the layer after next is offered as a target.
    pub skip_edge_chance: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            layers: NUM_LAYERS,
            min_nodes_per_layer: MIN_NODES_PER_LAYER,
            max_nodes_per_layer: MAX_NODES_PER_LAYER,
            width: MAP_WIDTH,
            height: MAP_HEIGHT,
            min_node_distance: MIN_NODE_DISTANCE,
            jitter: 0.5,
            double_connection_chance: 0.7,
            skip_edge_chance: 0.3,
        }
    }
}

impl MapConfig {
    /// Horizontal distance between two consecutive layers.
    #[must_use]
    pub fn layer_spacing(&self) -> f64 {
        self.width / f64::from(self.layers.saturating_sub(1).max(1))
    }
}

/// Generates floor maps from a [`MapConfig`] and an injected random source.
#[derive(Clone, Debug, Default)]
pub struct MapGenerator {
    config: MapConfig,
}

impl MapGenerator {
    /// Creates a generator, raising degenerate layer and node counts to the
    /// smallest values that still produce an entry and a boss layer.
    ///
    /// Chances are clamped to `0.0..=1.0` and jitter to at least zero; NaN
    /// falls back to zero.
    #[must_use]
    pub fn new(mut config: MapConfig) -> Self {
        config.layers = config.layers.max(2);
        config.min_nodes_per_layer = config.min_nodes_per_layer.max(1);
        config.max_nodes_per_layer = config.max_nodes_per_layer.max(config.min_nodes_per_layer);
        config.jitter = non_negative(config.jitter);
        config.double_connection_chance = probability(config.double_connection_chance);
        config.skip_edge_chance = probability(config.skip_edge_chance);
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Generates the map for `floor`.
    pub fn generate<R: Rng + ?Sized>(&self, floor: u32, rng: &mut R) -> GameMap {
        let mut nodes = Vec::new();
        let layers = self.synthesize_layers(&mut nodes, rng);
        self.synthesize_edges(&mut nodes, &layers, rng);
        repair_incoming(&mut nodes, &layers);
        repair_reachability(&mut nodes, &layers);

        let start_node_id = nodes[layers[0][0]].id;
        let end_node_ids = layers
            .last()
            .map(|layer| layer.iter().map(|&index| nodes[index].id).collect())
            .unwrap_or_default();

        let map = GameMap {
            floor,
            nodes,
            start_node_id,
            end_node_ids,
        };
        debug!(
            floor,
            nodes = map.nodes.len(),
            start = %start_node_id,
            crossings = total_crossings(&map),
            "generated floor map"
        );
        map
    }

    fn synthesize_layers<R: Rng + ?Sized>(
        &self,
        nodes: &mut Vec<MapNode>,
        rng: &mut R,
    ) -> Vec<Vec<usize>> {
        let config = &self.config;
        let spacing_x = config.layer_spacing();
        let mut layers = Vec::with_capacity(config.layers as usize);

        for layer in 0..config.layers {
            let count = rng.gen_range(config.min_nodes_per_layer..=config.max_nodes_per_layer);
            let spacing_y = config.height / f64::from(count + 1);
            let is_boss_layer = layer + 1 == config.layers;
            let mut indices = Vec::with_capacity(count as usize);

            for slot in 0..count {
                let node_type = if is_boss_layer {
                    NodeType::Boss
                } else {
                    random_node_type(rng)
                };
                let offset = (rng.gen::<f64>() - 0.5) * spacing_y * config.jitter;
                let y = (spacing_y * f64::from(slot + 1) + offset)
                    .min(config.height - config.min_node_distance)
                    .max(config.min_node_distance);

                indices.push(nodes.len());
                nodes.push(MapNode {
                    id: NodeId::new(nodes.len() as u32),
                    node_type,
                    layer,
                    position: MapPoint::new(f64::from(layer) * spacing_x, y),
                    connections: Vec::new(),
                    completed: false,
                    available: layer == 0,
                });
            }

            layers.push(indices);
        }

        layers
    }

    fn synthesize_edges<R: Rng + ?Sized>(
        &self,
        nodes: &mut [MapNode],
        layers: &[Vec<usize>],
        rng: &mut R,
    ) {
        for layer_index in 0..layers.len().saturating_sub(1) {
            for &source in &layers[layer_index] {
                let connection_count = if rng.gen_bool(self.config.double_connection_chance) {
                    2
                } else {
                    1
                };

                let mut candidates = layers[layer_index + 1].clone();
                if layer_index + 2 < layers.len() && rng.gen_bool(self.config.skip_edge_chance) {
                    candidates.extend_from_slice(&layers[layer_index + 2]);
                }

                let source_y = nodes[source].position.y;
                candidates.sort_by(|&a, &b| {
                    let distance_a = (nodes[a].position.y - source_y).abs();
                    let distance_b = (nodes[b].position.y - source_y).abs();
                    distance_a.total_cmp(&distance_b)
                });

                for _ in 0..connection_count {
                    let existing = edge_segments(nodes);
                    let source_position = nodes[source].position;
                    let Some(best) = fewest_crossings(
                        candidates
                            .iter()
                            .map(|&target| Segment::new(source_position, nodes[target].position)),
                        &existing,
                    ) else {
                        break;
                    };

                    let target = candidates.remove(best);
                    let target_id = nodes[target].id;
                    nodes[source].connections.push(target_id);
                }
            }
        }
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

fn probability(value: f64) -> f64 {
    non_negative(value).min(1.0)
}

/// Generates a map for `floor` with the default configuration.
pub fn generate_map<R: Rng + ?Sized>(floor: u32, rng: &mut R) -> GameMap {
    MapGenerator::default().generate(floor, rng)
}

fn random_node_type<R: Rng + ?Sized>(rng: &mut R) -> NodeType {
    NODE_TYPE_POOL[rng.gen_range(0..NODE_TYPE_POOL.len())]
}

/// Index of the first candidate adding the fewest crossings.
fn fewest_crossings(
    candidates: impl Iterator<Item = Segment>,
    existing: &[Segment],
) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (index, candidate) in candidates.enumerate() {
        let crossings = count_crossings(candidate, existing);
        if best.map_or(true, |(_, fewest)| crossings < fewest) {
            best = Some((index, crossings));
        }
    }
    best.map(|(index, _)| index)
}

fn has_incoming(nodes: &[MapNode], target: NodeId) -> bool {
    nodes.iter().any(|node| node.connects_to(target))
}

/// Gives every node past the entry layer at least one incoming edge.
fn repair_incoming(nodes: &mut [MapNode], layers: &[Vec<usize>]) {
    for layer_index in 1..layers.len() {
        for &target in &layers[layer_index] {
            let target_id = nodes[target].id;
            if has_incoming(nodes, target_id) {
                continue;
            }

            let existing = edge_segments(nodes);
            let target_position = nodes[target].position;
            let sources = &layers[layer_index - 1];
            let Some(best) = fewest_crossings(
                sources
                    .iter()
                    .map(|&source| Segment::new(nodes[source].position, target_position)),
                &existing,
            ) else {
                continue;
            };

            let source = sources[best];
            nodes[source].connections.push(target_id);
            debug!(node = %target_id, source = %nodes[source].id, "connected orphaned node");
        }
    }
}

/// Connects every unreachable final-layer node from the vertically closest
/// reachable node of the layer before it.
fn repair_reachability(nodes: &mut [MapNode], layers: &[Vec<usize>]) {
    let (Some(last), Some(previous)) = (layers.last(), layers.len().checked_sub(2)) else {
        return;
    };

    let reachable = reachable_indices(nodes, &layers[0]);
    for &end in last {
        if reachable[end] {
            continue;
        }

        let end_y = nodes[end].position.y;
        let mut closest: Option<usize> = None;
        for &candidate in layers[previous].iter().filter(|&&index| reachable[index]) {
            let distance = (nodes[candidate].position.y - end_y).abs();
            let is_closer = closest
                .map_or(true, |best| distance < (nodes[best].position.y - end_y).abs());
            if is_closer {
                closest = Some(candidate);
            }
        }

        if let Some(source) = closest {
            let end_id = nodes[end].id;
            nodes[source].connections.push(end_id);
            debug!(node = %end_id, source = %nodes[source].id, "connected unreachable end node");
        }
    }
}

fn reachable_indices(nodes: &[MapNode], entry: &[usize]) -> Vec<bool> {
    let mut reachable = vec![false; nodes.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();
    for &index in entry {
        reachable[index] = true;
        queue.push_back(index);
    }

    while let Some(current) = queue.pop_front() {
        for target in &nodes[current].connections {
            let target = target.get() as usize;
            if target < reachable.len() && !reachable[target] {
                reachable[target] = true;
                queue.push_back(target);
            }
        }
    }

    reachable
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn bare_node(index: usize, layer: u32, y: f64) -> MapNode {
        MapNode {
            id: NodeId::new(index as u32),
            node_type: NodeType::Combat,
            layer,
            position: MapPoint::new(f64::from(layer) * 200.0, y),
            connections: Vec::new(),
            completed: false,
            available: layer == 0,
        }
    }

    fn three_layer_fixture() -> (Vec<MapNode>, Vec<Vec<usize>>) {
        let nodes = vec![
            bare_node(0, 0, 200.0),
            bare_node(1, 0, 400.0),
            bare_node(2, 1, 200.0),
            bare_node(3, 1, 400.0),
            bare_node(4, 2, 150.0),
            bare_node(5, 2, 450.0),
        ];
        let layers = vec![vec![0, 1], vec![2, 3], vec![4, 5]];
        (nodes, layers)
    }

    #[test]
    fn orphaned_nodes_receive_an_incoming_edge() {
        let (mut nodes, layers) = three_layer_fixture();
        nodes[0].connections.push(NodeId::new(2));
        nodes[1].connections.push(NodeId::new(2));
        nodes[2].connections.push(NodeId::new(4));

        repair_incoming(&mut nodes, &layers);

        for index in 2..nodes.len() {
            assert!(
                has_incoming(&nodes, nodes[index].id),
                "node {index} still lacks an incoming edge"
            );
        }
        // The lower entry node reaches node 3 without crossing 0 -> 2.
        assert!(nodes[1].connects_to(NodeId::new(3)));
    }

    #[test]
    fn repair_prefers_the_source_that_adds_no_crossing() {
        let (mut nodes, layers) = three_layer_fixture();
        nodes[0].connections.push(NodeId::new(3));
        nodes[1].connections.push(NodeId::new(3));
        nodes[3].connections.push(NodeId::new(4));
        nodes[3].connections.push(NodeId::new(5));

        repair_incoming(&mut nodes, &layers);

        // Reaching node 2 from node 1 would cross 0 -> 3.
        assert!(nodes[0].connects_to(NodeId::new(2)));
        assert!(!nodes[1].connects_to(NodeId::new(2)));
    }

    #[test]
    fn unreachable_end_nodes_connect_from_closest_reachable_node() {
        let (mut nodes, layers) = three_layer_fixture();
        nodes[0].connections.push(NodeId::new(3));
        nodes[3].connections.push(NodeId::new(5));
        // Node 2 is unreachable, so it cannot serve as a source for node 4
        // even though it is vertically closer.
        nodes[2].connections.push(NodeId::new(5));

        repair_reachability(&mut nodes, &layers);

        assert!(nodes[3].connects_to(NodeId::new(4)));
        assert!(!nodes[2].connects_to(NodeId::new(4)));
        let reachable = reachable_indices(&nodes, &layers[0]);
        assert!(reachable[4] && reachable[5]);
    }

    #[test]
    fn layers_hold_configured_node_counts() {
        let generator = MapGenerator::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for floor in 1..=8 {
            let map = generator.generate(floor, &mut rng);
            assert_eq!(map.floor, floor);
            assert_eq!(map.layer_count(), NUM_LAYERS);
            for layer in 0..NUM_LAYERS {
                let count = map.layer(layer).count() as u32;
                assert!(
                    (MIN_NODES_PER_LAYER..=MAX_NODES_PER_LAYER).contains(&count),
                    "layer {layer} holds {count} nodes"
                );
            }
        }
    }

    #[test]
    fn nodes_are_placed_on_layer_columns_within_margins() {
        let generator = MapGenerator::default();
        let spacing = generator.config().layer_spacing();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let map = generator.generate(1, &mut rng);

        for node in &map.nodes {
            assert_eq!(node.position.x, f64::from(node.layer) * spacing);
            assert!(node.position.y >= MIN_NODE_DISTANCE);
            assert!(node.position.y <= MAP_HEIGHT - MIN_NODE_DISTANCE);
        }
    }

    #[test]
    fn final_layer_is_all_bosses_and_others_never_are() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let map = generate_map(2, &mut rng);
        for node in &map.nodes {
            let is_last = node.layer + 1 == NUM_LAYERS;
            assert_eq!(node.node_type == NodeType::Boss, is_last);
            assert_ne!(node.node_type, NodeType::Victory);
        }
        let ends: Vec<NodeId> = map.layer(NUM_LAYERS - 1).map(|node| node.id).collect();
        assert_eq!(map.end_node_ids, ends);
        assert_eq!(
            Some(map.start_node_id),
            map.layer(0).next().map(|node| node.id)
        );
    }

    #[test]
    fn only_the_entry_layer_starts_available() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let map = generate_map(1, &mut rng);
        for node in &map.nodes {
            assert_eq!(node.available, node.layer == 0);
            assert!(!node.completed);
        }
    }

    #[test]
    fn degenerate_configuration_is_raised_to_two_layers() {
        let generator = MapGenerator::new(MapConfig {
            layers: 0,
            min_nodes_per_layer: 0,
            max_nodes_per_layer: 0,
            ..MapConfig::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let map = generator.generate(1, &mut rng);
        assert_eq!(map.layer_count(), 2);
        assert_eq!(map.nodes.len(), 2);
        assert!(map.nodes[0].connects_to(map.nodes[1].id));
    }

    #[test]
    fn out_of_range_chances_are_clamped() {
        let generator = MapGenerator::new(MapConfig {
            jitter: -2.0,
            double_connection_chance: 1.5,
            skip_edge_chance: -0.5,
            ..MapConfig::default()
        });
        let config = generator.config();
        assert_eq!(config.jitter, 0.0);
        assert_eq!(config.double_connection_chance, 1.0);
        assert_eq!(config.skip_edge_chance, 0.0);

        let nan = MapGenerator::new(MapConfig {
            skip_edge_chance: f64::NAN,
            ..MapConfig::default()
        });
        assert_eq!(nan.config().skip_edge_chance, 0.0);

        let mut rng = ChaCha8Rng::seed_from_u64(8);
        for floor in 1..=4 {
            let map = generator.generate(floor, &mut rng);
            for node in map.nodes.iter().filter(|node| node.layer + 1 < NUM_LAYERS) {
                let next_layer = map.layer(node.layer + 1).count();
                assert!(node.connections.len() >= next_layer.min(2));
                for target in &node.connections {
                    let target = map.node(*target).expect("edge points at a node");
                    assert_eq!(target.layer, node.layer + 1, "skip edges are disabled");
                }
            }
        }
    }
}
