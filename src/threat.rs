use super::cache::*;
use super::constants::*;
use super::findnearest::*;
use super::spatial::*;
use super::unit::*;
use super::world::*;
use std::collections::HashSet;

fn is_air_threat(unit: &Unit) -> bool {
    !unit.is_hallucination() && !unit.kind.is_scout() && !unit.is_undetected()
}

fn is_ground_threat(unit: &Unit) -> bool {
    !unit.is_hallucination() && !unit.is_burrowed() && !unit.kind.is_changeling() && !unit.is_undetected()
}

/// Enemies considered to be attacking the bases this tick.
#[derive(Clone, Debug, Default)]
pub struct ThreatSet {
    pub air: Vec<Unit>,
    pub ground: Vec<Unit>,
}

impl ThreatSet {
    pub fn is_empty(&self) -> bool {
        self.air.is_empty() && self.ground.is_empty()
    }
}

#[derive(Default)]
pub struct ThreatAssessor {
    threats: TickCache<ThreatSet>,
}

impl ThreatAssessor {
    /// Threat sets for this tick. When any enemy of a class is near a ready townhall,
    /// the whole class is reported.
    pub fn assess(&mut self, observation: &Observation, spatial: &SpatialIndex) -> &ThreatSet {
        self.threats.get_or_insert_with(observation.game_loop, || ThreatSet {
            air: Self::class_threats(observation, spatial, UnitSet::EnemyFlying, is_air_threat),
            ground: Self::class_threats(observation, spatial, UnitSet::EnemyGround, is_ground_threat),
        })
    }

    /// Use threat sets computed by the caller for this tick.
    pub fn supply(&mut self, game_loop: u32, threats: ThreatSet) -> &ThreatSet {
        self.threats.insert(game_loop, threats);

        self.threats.get_or_insert_with(game_loop, ThreatSet::default)
    }

    fn class_threats<F>(observation: &Observation, spatial: &SpatialIndex, set: UnitSet, filter: F) -> Vec<Unit>
    where
        F: Fn(&Unit) -> bool,
    {
        let near_base = observation.ready_townhalls().any(|townhall| {
            spatial
                .units(set)
                .find_nearest_linear_with_distance(townhall.position)
                .map(|(_, distance)| distance < THREAT_RADIUS)
                .unwrap_or(false)
        });

        if !near_base {
            return Vec::new();
        }

        spatial.units(set).filter(|u| filter(u)).cloned().collect()
    }
}

/// Threats whose kind is on the priority list. `None` when there is no list or nothing to filter.
pub fn priority_subset(threats: &ThreatSet, priority_list: &HashSet<UnitKind>) -> Option<Vec<Unit>> {
    if priority_list.is_empty() || threats.is_empty() {
        return None;
    }

    Some(
        threats
            .air
            .iter()
            .chain(threats.ground.iter())
            .filter(|u| priority_list.contains(&u.kind))
            .cloned()
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::*;

    fn observation(enemies: Vec<Unit>) -> Observation {
        let map = MapInfo::open(128, 128, Point2::new(10.0, 10.0), Point2::new(110.0, 110.0));
        let mut observation = Observation::new(0, &map);
        observation.structures = vec![Unit::new(100, UnitKind::Hatchery, Point2::new(10.0, 10.0))];
        observation.enemy_units = enemies;
        observation
    }

    fn assess(observation: &Observation) -> ThreatSet {
        let spatial = SpatialIndex::build(observation);

        ThreatAssessor::default().assess(observation, &spatial).clone()
    }

    #[test]
    fn one_enemy_near_base_flags_entire_class() {
        let threats = assess(&observation(vec![
            Unit::new(1, UnitKind::Zergling, Point2::new(20.0, 10.0)),
            Unit::new(2, UnitKind::Zergling, Point2::new(100.0, 100.0)),
        ]));

        assert_eq!(threats.ground.len(), 2);
        assert!(threats.air.is_empty());
    }

    #[test]
    fn distant_enemies_are_not_threats() {
        let threats = assess(&observation(vec![Unit::new(1, UnitKind::Marine, Point2::new(40.0, 10.0))]));

        assert!(threats.is_empty());
    }

    #[test]
    fn cosmetic_units_are_excluded() {
        let threats = assess(&observation(vec![
            Unit::new(1, UnitKind::Overlord, Point2::new(12.0, 10.0)).with_flags(UnitFlags::FLYING),
            Unit::new(2, UnitKind::Mutalisk, Point2::new(60.0, 60.0)).with_flags(UnitFlags::FLYING),
            Unit::new(3, UnitKind::Changeling, Point2::new(12.0, 12.0)),
            Unit::new(4, UnitKind::Roach, Point2::new(14.0, 12.0)).with_flags(UnitFlags::BURROWED),
            Unit::new(5, UnitKind::Zealot, Point2::new(15.0, 12.0)).with_flags(UnitFlags::HALLUCINATION),
        ]));

        let air: Vec<Tag> = threats.air.iter().map(|u| u.tag).collect();

        // The overlord triggers the scan but is never reported itself.
        assert_eq!(air, vec![2]);
        assert!(threats.ground.is_empty());
    }

    #[test]
    fn priority_subset_filters_by_kind() {
        let threats = assess(&observation(vec![
            Unit::new(1, UnitKind::Zergling, Point2::new(20.0, 10.0)),
            Unit::new(2, UnitKind::Baneling, Point2::new(21.0, 10.0)),
        ]));

        let list: HashSet<UnitKind> = [UnitKind::Baneling].into_iter().collect();
        let subset = priority_subset(&threats, &list).unwrap();

        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].tag, 2);
        assert!(priority_subset(&threats, &HashSet::new()).is_none());
        assert!(priority_subset(&ThreatSet::default(), &list).is_none());
    }

    #[test]
    fn unready_townhalls_do_not_anchor_threats() {
        let mut observation = observation(vec![Unit::new(1, UnitKind::Zergling, Point2::new(20.0, 10.0))]);
        observation.structures[0] = observation.structures[0].clone().without_flags(UnitFlags::READY);

        assert!(assess(&observation).is_empty());
    }
}
