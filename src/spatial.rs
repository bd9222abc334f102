use super::constants::*;
use super::findnearest::*;
use super::geometry::*;
use super::unit::*;
use super::world::*;
use rstar::{RTree, RTreeObject, AABB};

/// Position-only entry so the tree does not own unit snapshots.
#[derive(Clone, Debug)]
struct UnitLocation {
    index: usize,
    position: [f32; 2],
}

impl RTreeObject for UnitLocation {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

#[derive(Default)]
struct UnitTree {
    units: Vec<Unit>,
    tree: RTree<UnitLocation>,
}

impl UnitTree {
    fn build(units: Vec<Unit>) -> UnitTree {
        let locations = units
            .iter()
            .enumerate()
            .map(|(index, unit)| UnitLocation {
                index,
                position: [unit.position.x, unit.position.y],
            })
            .collect();

        UnitTree {
            units,
            tree: RTree::bulk_load(locations),
        }
    }

    fn query<'a>(&'a self, center: Point2, radius: f32, output: &mut Vec<&'a Unit>) {
        let envelope = AABB::from_corners([center.x - radius, center.y - radius], [center.x + radius, center.y + radius]);
        let radius_squared = radius * radius;

        for location in self.tree.locate_in_envelope(&envelope) {
            let unit = &self.units[location.index];

            if unit.position.distance_squared(center) <= radius_squared {
                output.push(unit);
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnitSet {
    Own,
    EnemyGround,
    EnemyFlying,
    Enemy,
}

/// Radius queries over own and enemy units, rebuilt every tick.
#[derive(Default)]
pub struct SpatialIndex {
    own: UnitTree,
    enemy_ground: UnitTree,
    enemy_flying: UnitTree,
}

impl SpatialIndex {
    pub fn build(observation: &Observation) -> SpatialIndex {
        let own = observation
            .units
            .iter()
            .chain(observation.structures.iter())
            .cloned()
            .collect();

        let (enemy_flying, enemy_ground): (Vec<Unit>, Vec<Unit>) = observation.all_enemies().cloned().partition(|u| u.is_flying());

        SpatialIndex {
            own: UnitTree::build(own),
            enemy_ground: UnitTree::build(enemy_ground),
            enemy_flying: UnitTree::build(enemy_flying),
        }
    }

    fn trees(&self, set: UnitSet) -> impl Iterator<Item = &UnitTree> {
        let trees = match set {
            UnitSet::Own => [Some(&self.own), None],
            UnitSet::EnemyGround => [Some(&self.enemy_ground), None],
            UnitSet::EnemyFlying => [Some(&self.enemy_flying), None],
            UnitSet::Enemy => [Some(&self.enemy_ground), Some(&self.enemy_flying)],
        };

        trees.into_iter().flatten()
    }

    pub fn units(&self, set: UnitSet) -> impl Iterator<Item = &Unit> {
        self.trees(set).flat_map(|tree| tree.units.iter())
    }

    pub fn query_radius(&self, center: Point2, radius: f32, set: UnitSet) -> Vec<&Unit> {
        let mut output = Vec::new();

        for tree in self.trees(set) {
            tree.query(center, radius, &mut output);
        }

        output
    }

    pub fn nearest(&self, point: Point2, set: UnitSet) -> Option<&Unit> {
        self.units(set).find_nearest_linear(point)
    }

    /// Detected enemies `unit` can shoot from where it stands, allowing `bonus` extra range.
    pub fn enemies_in_attack_range_of(&self, unit: &Unit, bonus: f32) -> Vec<&Unit> {
        let in_range = |enemy: &Unit, range: f32| enemy.position.distance_to(unit.position) <= range + unit.radius + enemy.radius + bonus;

        let mut output = Vec::new();

        if unit.can_attack_ground() {
            let reach = unit.ground_range + unit.radius + MAX_UNIT_RADIUS + bonus;

            for enemy in self.query_radius(unit.position, reach, UnitSet::EnemyGround) {
                if in_range(enemy, unit.ground_range) {
                    output.push(enemy);
                }
            }
        }

        if unit.can_attack_air() {
            let reach = unit.air_range + unit.radius + MAX_UNIT_RADIUS + bonus;

            for enemy in self.query_radius(unit.position, reach, UnitSet::EnemyFlying) {
                if in_range(enemy, unit.air_range) {
                    output.push(enemy);
                }
            }

            for enemy in self.query_radius(unit.position, reach, UnitSet::EnemyGround) {
                let already_counted = output.iter().any(|o| o.tag == enemy.tag);

                if enemy.kind.is_hit_by_anti_air() && !already_counted && in_range(enemy, unit.air_range) {
                    output.push(enemy);
                }
            }
        }

        output.retain(|enemy| !enemy.is_undetected());

        output
    }
}
