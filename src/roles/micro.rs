//! Combat and safety routines shared by every role.

use super::*;
use crate::constants::*;
use crate::findnearest::*;
use crate::geometry::*;
use std::cmp::Ordering;
use std::f32::consts::PI;

const OVERSEER_ESCORT_RANGE: f32 = 10.0;
/// Cooldown right after the first shot of the queen's double attack. Let the second shot go before kiting.
const DOUBLE_ATTACK_COOLDOWN: f32 = 9.0;
const SHORT_PATH_SENSITIVITY: usize = 2;

fn is_valid_target(enemy: &Unit, attack_static_defence: bool) -> bool {
    !enemy.kind.is_ignored_target() && (attack_static_defence || !enemy.kind.is_static_defence()) && !enemy.is_undetected()
}

fn angle_difference(a: f32, b: f32) -> f32 {
    let diff = (a - b).rem_euclid(2.0 * PI);

    diff.min(2.0 * PI - diff)
}

/// Flying targets first, then lowest health plus shield, ties broken by tag.
pub fn select_target<'a>(candidates: &[&'a Unit]) -> Option<&'a Unit> {
    let flying: Vec<&Unit> = candidates.iter().copied().filter(|u| u.is_flying()).collect();
    let pool = if flying.is_empty() { candidates } else { &flying[..] };

    pool.iter().copied().min_by(|a, b| {
        (a.health + a.shield)
            .partial_cmp(&(b.health + b.shield))
            .unwrap_or(Ordering::Equal)
            .then(a.tag.cmp(&b.tag))
    })
}

/// Whether to shoot now: true when turning and closing the distance would take at least as long as the
/// remaining weapon cooldown.
pub fn attack_ready(unit: &Unit, target: &Unit, game_step: u32) -> bool {
    if unit.weapon_cooldown <= 0.0 || unit.weapon_cooldown > DOUBLE_ATTACK_COOLDOWN {
        return true;
    }

    let step_time = game_step as f32 / GAME_LOOPS_PER_SECOND;

    let turn_rate = (QUEEN_TURN_RATE * SPEED_MULTIPLIER).to_radians();
    let turn_time = angle_difference(unit.facing, unit.position.angle_to(target.position)) / turn_rate;

    let range = if target.is_flying() || target.kind.is_hit_by_anti_air() {
        unit.air_range
    } else {
        unit.ground_range
    };
    let gap = (unit.distance_to(target.position) - unit.radius - target.radius - range).max(0.0);
    let move_time = if gap <= 0.0 {
        0.0
    } else if unit.movement_speed > 0.0 {
        gap / (unit.movement_speed * SPEED_MULTIPLIER)
    } else {
        f32::INFINITY
    };

    step_time + turn_time + move_time >= unit.weapon_cooldown / GAME_LOOPS_PER_SECOND
}

/// Point just outside the unit's ground range from `enemy`, if it can be walked to.
pub fn step_out_of_range(unit: &Unit, enemy: &Unit, padding: f32, context: &RoleContext) -> Option<Command> {
    let distance = unit.ground_range + unit.radius + enemy.radius + padding;
    let move_to = enemy.position.towards(unit.position, distance);

    if context.map.in_pathing_grid(move_to) {
        Some(Command::Move(move_to))
    } else {
        None
    }
}

/// Fight `enemies`: shoot what is in range, kite while reloading, otherwise close in on the nearest.
pub fn engage<'a, I>(unit: &Unit, enemies: I, attack_static_defence: bool, context: &RoleContext) -> Option<Command>
where
    I: IntoIterator<Item = &'a Unit>,
{
    let enemies: Vec<&Unit> = enemies.into_iter().collect();
    let targets: Vec<&Unit> = enemies
        .iter()
        .copied()
        .filter(|e| is_valid_target(e, attack_static_defence))
        .collect();

    let in_range = context.spatial.enemies_in_attack_range_of(unit, ATTACK_RANGE_BONUS);

    if !in_range.is_empty() {
        let candidates: Vec<&Unit> = in_range
            .iter()
            .copied()
            .filter(|e| is_valid_target(e, attack_static_defence))
            .collect();

        return match select_target(&candidates) {
            Some(target) if attack_ready(unit, target, context.observation.game_step) => Some(Command::attack_unit(target.tag)),
            Some(_) if context.terrain.is_some() => Some(move_towards_safe_spot(unit, GridLayer::Ground, context)),
            Some(target) => step_out_of_range(unit, target, 0.0, context),
            None => Point2::center(in_range.iter().map(|e| e.position)).map(Command::attack_move),
        };
    }

    if let Some(closest) = targets.iter().copied().find_nearest_linear(unit.position) {
        return Some(Command::Move(closest.position));
    }

    if enemies.is_empty() {
        return None;
    }

    match context.terrain {
        Some(terrain) => {
            // Out of sight: regroup with detection or static anti-air until something is targetable.
            let escorted = context
                .observation
                .units
                .iter()
                .filter(|u| u.kind == UnitKind::Overseer)
                .find_nearest_linear_with_distance(unit.position)
                .map(|(_, distance)| distance < OVERSEER_ESCORT_RANGE)
                .unwrap_or(false);

            if escorted {
                return Point2::center(enemies.iter().map(|e| e.position)).map(Command::attack_move);
            }

            match context
                .observation
                .structures_of(UnitKind::SporeCrawler)
                .find_nearest_linear(unit.position)
            {
                Some(spore) => {
                    let waypoint = terrain
                        .pathfind(unit.position, spore.position, GridLayer::Ground, SHORT_PATH_SENSITIVITY)
                        .and_then(|path| path.first().copied())
                        .unwrap_or(spore.position);

                    Some(Command::Move(waypoint))
                }
                None => Some(move_towards_safe_spot(unit, GridLayer::Ground, context)),
            }
        }
        None => {
            let closest = enemies.iter().copied().find_nearest_linear(unit.position)?;

            step_out_of_range(unit, closest, 1.0, context)
        }
    }
}

/// Push towards `attack_target`, regrouping between shots when the pack is thin.
pub fn offensive_micro(unit: &Unit, attack_target: Point2, context: &RoleContext) -> Option<Command> {
    let in_range = context.spatial.enemies_in_attack_range_of(unit, ATTACK_RANGE_BONUS);

    let target = match select_target(&in_range) {
        Some(target) => target,
        None => return Some(Command::attack_move(attack_target)),
    };

    if attack_ready(unit, target, context.observation.game_step) {
        return Some(Command::attack_unit(target.tag));
    }

    let close_queens: Vec<Point2> = context
        .spatial
        .query_radius(unit.position, OFFENSIVE_GROUP_RADIUS, UnitSet::Own)
        .into_iter()
        .filter(|u| u.kind == UnitKind::Queen)
        .map(|u| u.position)
        .collect();

    if close_queens.len() <= OFFENSIVE_GROUP_SIZE {
        let pack_center = Point2::center(context.observation.queens().map(|q| q.position)).unwrap_or(unit.position);

        Some(Command::Move(pack_center))
    } else {
        Some(Command::Move(attack_target))
    }
}

/// Head for the cheapest nearby cell, or home without terrain data.
pub fn move_towards_safe_spot(unit: &Unit, layer: GridLayer, context: &RoleContext) -> Command {
    let terrain = match context.terrain {
        Some(terrain) => terrain,
        None => return Command::Move(context.map.start_location),
    };

    let spot = match terrain.closest_safe_spot(unit.position, SAFE_SPOT_RADIUS, layer) {
        Some(spot) => spot,
        None => return Command::Move(context.map.start_location),
    };

    let waypoint = terrain
        .pathfind(unit.position, spot, layer, SHORT_PATH_SENSITIVITY)
        .and_then(|path| path.first().copied())
        .unwrap_or(spot);

    Command::Move(waypoint)
}

/// Retreat order when the unit is targeted by a lock-on or standing somewhere dangerous.
pub fn keep_safe(unit: &Unit, context: &RoleContext) -> Option<Command> {
    let home = context.map.start_location;

    if unit.flags.contains(UnitFlags::LOCKED_ON) {
        let waypoint = context
            .terrain
            .and_then(|terrain| terrain.pathfind(unit.position, home, GridLayer::Ground, SHORT_PATH_SENSITIVITY))
            .and_then(|path| path.first().copied())
            .unwrap_or(home);

        return Some(Command::Move(waypoint));
    }

    match context.terrain {
        Some(terrain) if !terrain.is_position_safe(unit.position, GridLayer::Avoidance) => {
            Some(move_towards_safe_spot(unit, GridLayer::Avoidance, context))
        }
        _ => None,
    }
}

/// Heal the closest badly hurt friendly in reach that no one else is healing this tick.
pub fn transfuse_target<'a>(unit: &Unit, claimed: &std::collections::HashSet<Tag>, context: &RoleContext<'a>) -> Option<&'a Unit> {
    if unit.energy < TRANSFUSE_ENERGY_COST {
        return None;
    }

    context
        .spatial
        .query_radius(unit.position, TRANSFUSE_SEARCH_RANGE, UnitSet::Own)
        .into_iter()
        .filter(|u| {
            u.tag != unit.tag
                && !claimed.contains(&u.tag)
                && u.kind.is_transfusable()
                && u.health_percentage() < TRANSFUSE_HEALTH_THRESHOLD
        })
        .find_nearest_linear(unit.position)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::grid::*;
    use std::collections::HashSet;

    pub(crate) struct Fixture {
        pub map: MapInfo,
        pub observation: Observation,
        pub policy: QueenPolicy,
        pub coverage: CoverageMap,
        pub threats: ThreatSet,
        pub terrain: Option<TerrainGrids>,
        pub commands: Vec<(Tag, Command)>,
    }

    impl Fixture {
        pub fn new() -> Fixture {
            let map = MapInfo::open(64, 64, Point2::new(8.5, 8.5), Point2::new(56.5, 56.5));
            let observation = Observation::new(0, &map);

            Fixture {
                policy: QueenPolicy::default().resolve(&map),
                map,
                observation,
                coverage: CoverageMap::default(),
                threats: ThreatSet::default(),
                terrain: None,
                commands: Vec::new(),
            }
        }

        pub fn run<R, F>(&mut self, f: F) -> R
        where
            F: FnOnce(&mut RoleContext) -> R,
        {
            let spatial = SpatialIndex::build(&self.observation);
            let mut context = RoleContext {
                map: &self.map,
                observation: &self.observation,
                spatial: &spatial,
                coverage: &self.coverage,
                threats: &self.threats,
                priority_threats: None,
                policy: &self.policy,
                terrain: self.terrain.as_ref().map(|t| t as &dyn TerrainOracle),
                commands: &mut self.commands,
            };

            f(&mut context)
        }
    }

    #[test]
    fn flying_targets_preferred_then_lowest_health() {
        let a = Unit::new(5, UnitKind::Marine, Point2::default()).with_health(10.0);
        let b = Unit::new(3, UnitKind::Viking, Point2::default()).with_flags(UnitFlags::FLYING).with_health(90.0);
        let c = Unit::new(2, UnitKind::Viking, Point2::default()).with_flags(UnitFlags::FLYING).with_health(90.0);

        assert_eq!(select_target(&[&a, &b, &c]).map(|u| u.tag), Some(2));
        assert_eq!(select_target(&[&a]).map(|u| u.tag), Some(5));
        assert_eq!(select_target(&[]), None);
    }

    #[test]
    fn attack_ready_waits_for_cooldown_when_adjacent() {
        let mut queen = Unit::queen(1, Point2::new(10.0, 10.0));
        let target = Unit::new(2, UnitKind::Zergling, Point2::new(13.0, 10.0));

        assert!(attack_ready(&queen, &target, 8));

        // Facing the target and in range while reloading: kite instead.
        queen.weapon_cooldown = 5.0;
        assert!(!attack_ready(&queen, &target, 1));

        // Second shot of the double attack is still due.
        queen.weapon_cooldown = 12.0;
        assert!(attack_ready(&queen, &target, 1));
        queen.weapon_cooldown = 5.0;

        // Far away: closing in takes longer than reloading.
        let far = Unit::new(3, UnitKind::Zergling, Point2::new(30.0, 10.0));
        assert!(attack_ready(&queen, &far, 1));
    }

    #[test]
    fn engage_attacks_in_range_target() {
        let mut fixture = Fixture::new();
        fixture.observation.enemy_units = vec![Unit::new(7, UnitKind::Zergling, Point2::new(13.0, 10.0))];
        let queen = Unit::queen(1, Point2::new(10.0, 10.0));

        let command = fixture.run(|context| engage(&queen, context.observation.enemy_units.iter(), false, context));

        assert_eq!(command, Some(Command::attack_unit(7)));
    }

    #[test]
    fn engage_moves_to_nearest_out_of_range() {
        let mut fixture = Fixture::new();
        fixture.observation.enemy_units = vec![
            Unit::new(7, UnitKind::Zergling, Point2::new(30.0, 10.0)),
            Unit::new(8, UnitKind::Zergling, Point2::new(40.0, 10.0)),
        ];
        let queen = Unit::queen(1, Point2::new(10.0, 10.0));

        let command = fixture.run(|context| engage(&queen, context.observation.enemy_units.iter(), false, context));

        assert_eq!(command, Some(Command::Move(Point2::new(30.0, 10.0))));
    }

    #[test]
    fn engage_backs_off_static_defence_it_will_not_attack() {
        let mut fixture = Fixture::new();
        fixture.observation.enemy_structures = vec![Unit::new(7, UnitKind::PhotonCannon, Point2::new(30.0, 10.0))];
        let queen = Unit::queen(1, Point2::new(10.0, 10.0));

        let command = fixture.run(|context| engage(&queen, context.observation.enemy_structures.iter(), false, context));

        match command {
            Some(Command::Move(point)) => assert!(point.x < 30.0 && point.x > 20.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn locked_on_units_run_home() {
        let mut fixture = Fixture::new();
        let queen = Unit::queen(1, Point2::new(30.0, 30.0)).with_flags(UnitFlags::LOCKED_ON);

        let command = fixture.run(|context| keep_safe(&queen, context));

        assert_eq!(command, Some(Command::Move(Point2::new(8.5, 8.5))));
    }

    #[test]
    fn dangerous_cells_trigger_retreat_only_with_terrain() {
        let mut fixture = Fixture::new();
        let queen = Unit::queen(1, Point2::new(30.5, 30.5));

        assert_eq!(fixture.run(|context| keep_safe(&queen, context)), None);

        let mut grids = TerrainGrids::new(Grid::new(64, 64, 1.0));
        let mut avoidance = Grid::new(64, 64, 1.0);
        avoidance.set(30, 30, 5.0);
        grids.avoidance = Some(avoidance);
        fixture.terrain = Some(grids);

        match fixture.run(|context| keep_safe(&queen, context)) {
            Some(Command::Move(point)) => assert!(point.distance_to(queen.position) <= 1.5),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn transfuse_picks_hurt_unclaimed_friendly() {
        let mut fixture = Fixture::new();
        let queen = Unit::queen(1, Point2::new(10.0, 10.0)).with_energy(80.0);
        fixture.observation.units = vec![
            queen.clone(),
            Unit::queen(2, Point2::new(12.0, 10.0)).with_health(50.0),
            Unit::new(3, UnitKind::Zergling, Point2::new(11.0, 10.0)).with_health(5.0),
        ];

        let target = fixture.run(|context| transfuse_target(&queen, &HashSet::new(), context).map(|u| u.tag));
        assert_eq!(target, Some(2));

        let claimed: HashSet<Tag> = [2].into_iter().collect();
        let target = fixture.run(|context| transfuse_target(&queen, &claimed, context).map(|u| u.tag));
        assert_eq!(target, None);

        let drained = queen.clone().with_energy(40.0);
        let target = fixture.run(|context| transfuse_target(&drained, &HashSet::new(), context).map(|u| u.tag));
        assert_eq!(target, None);
    }
}
