//! Where tumors go: queen placements towards the creep targets, and follow-up spreads from
//! burrowed tumors once their cooldown is up.

use super::*;
use crate::constants::*;
use crate::findnearest::*;
use crate::geometry::*;
use log::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;

/// Tumor position in half units.
type TumorKey = (i32, i32);

/// Tumors sit on cell centers, so snap to the nearest half unit and push whole numbers onto the center.
fn snap_axis(value: f32) -> f32 {
    let snapped = (value * 2.0).round() / 2.0;

    if snapped.fract() == 0.0 {
        snapped + 0.5
    } else {
        snapped
    }
}

fn tumor_key(position: Point2) -> TumorKey {
    ((snap_axis(position.x) * 2.0) as i32, (snap_axis(position.y) * 2.0) as i32)
}

pub struct TumorPlanner {
    target_index: usize,
    first_tumor: bool,
    first_tumor_attempts: u32,
    /// Ordered placements not yet seen as tumors, with the time they were ordered.
    pending: Vec<(Point2, f32)>,
    tumor_positions: HashSet<TumorKey>,
    cooldown_started: HashMap<Tag, u32>,
    active_since: HashMap<Tag, f32>,
    spent: HashSet<Tag>,
    rng: StdRng,
}

impl TumorPlanner {
    pub fn new(seed: u64) -> TumorPlanner {
        TumorPlanner {
            target_index: 0,
            first_tumor: true,
            first_tumor_attempts: 0,
            pending: Vec::new(),
            tumor_positions: HashSet::new(),
            cooldown_started: HashMap::new(),
            active_since: HashMap::new(),
            spent: HashSet::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn target_index(&self) -> usize {
        self.target_index
    }

    pub fn pending(&self) -> &[(Point2, f32)] {
        &self.pending
    }

    pub fn add_tumor_position(&mut self, position: Point2) {
        self.tumor_positions.insert(tumor_key(position));
    }

    /// Records an ordered placement so later placements keep their spacing from it.
    fn commit(&mut self, position: Point2, time: f32) {
        self.add_tumor_position(position);

        let key = tumor_key(position);

        if !self.pending.iter().any(|(p, _)| tumor_key(*p) == key) {
            self.pending.push((position, time));
        }
    }

    pub fn is_spent(&self, tag: Tag) -> bool {
        self.spent.contains(&tag)
    }

    /// Drop bookkeeping for a tumor that no longer exists.
    pub fn forget(&mut self, tag: Tag) {
        self.cooldown_started.remove(&tag);
        self.active_since.remove(&tag);
        self.spent.remove(&tag);
    }

    pub fn valid_placement(&self, position: Point2, context: &RoleContext) -> bool {
        self.check_placement(position, context, true)
    }

    fn check_placement(&self, position: Point2, context: &RoleContext, check_recorded: bool) -> bool {
        let map = context.map;
        let observation = context.observation;
        let policy = &context.policy.creep;

        if !map.in_placement_grid(position) || !observation.is_visible(position) || !observation.has_creep(position) {
            return false;
        }

        if check_recorded {
            let key = tumor_key(position);

            if self.tumor_positions.contains(&key) || self.pending.iter().any(|(p, _)| tumor_key(*p) == key) {
                return false;
            }
        }

        if !policy.should_tumors_block_expansions
            && map
                .expansions
                .iter()
                .copied()
                .within_distance(position, BLOCK_EXPANSION_RADIUS)
                .next()
                .is_some()
        {
            return false;
        }

        if observation
            .enemy_townhalls()
            .within_distance(position, ENEMY_TOWNHALL_RADIUS)
            .next()
            .is_some()
        {
            return false;
        }

        if observation
            .structures_of(UnitKind::NydusCanal)
            .within_distance(position, NYDUS_CLEARANCE_RADIUS)
            .next()
            .is_some()
        {
            return false;
        }

        if self.too_close_to_tumors(position, context, !check_recorded) {
            return false;
        }

        !observation
            .enemy_units
            .iter()
            .within_distance(position, ENEMY_CLEARANCE_RADIUS)
            .any(|enemy| enemy.can_attack_ground() && !enemy.kind.is_harmless_near_tumor())
    }

    /// A spacing of zero turns the check off. A retry ignores its own pending record.
    fn too_close_to_tumors(&self, position: Point2, context: &RoleContext, retry: bool) -> bool {
        let spacing = context.policy.creep.distance_between_queen_tumors;

        if spacing <= 0.0 {
            return false;
        }

        let key = tumor_key(position);

        context
            .observation
            .creep_tumors()
            .within_distance(position, spacing)
            .next()
            .is_some()
            || self
                .pending
                .iter()
                .map(|(p, _)| *p)
                .filter(|p| !retry || tumor_key(*p) != key)
                .within_distance(position, spacing)
                .next()
                .is_some()
    }

    /// Order for a queen with tumor energy, moving on to the next creep target whatever happens.
    pub fn spread_creep(&mut self, unit: &Unit, context: &RoleContext) -> Option<Command> {
        let policy = &context.policy.creep;

        if self.target_index >= policy.creep_targets.len() {
            self.target_index = 0;
        }

        if self.first_tumor {
            if let Some(first) = policy.first_tumor_position {
                if !self.check_placement(first, context, false) {
                    debug!("Skipping unusable first tumor position {:?}", first);

                    self.first_tumor = false;

                    return None;
                }

                self.commit(first, context.observation.time);

                // Queens are sometimes body blocked right after spawning, so retry a few times.
                self.first_tumor_attempts += 1;
                if self.first_tumor_attempts >= FIRST_TUMOR_RETRIES {
                    self.first_tumor = false;
                }

                return Some(Command::ability(Ability::BuildCreepTumorQueen, Target::Point(first)));
            }
        }

        let placement = match policy.creep_targets.get(self.target_index) {
            Some(target) => match context.terrain {
                Some(terrain) => self.find_closest_to_target_using_path(target, terrain, context),
                None => self.find_closest_to_target(target.position(context.map), context),
            },
            None => None,
        };

        self.target_index += 1;

        let enemies_close = context
            .observation
            .enemy_units
            .iter()
            .within_distance(unit.position, QUEEN_TUMOR_ENEMY_RADIUS)
            .any(|enemy| !enemy.is_flying());

        match placement {
            Some(position) if !enemies_close => {
                self.commit(position, context.observation.time);

                Some(Command::ability(Ability::BuildCreepTumorQueen, Target::Point(position)))
            }
            _ => {
                let rally_point = policy.rally_point(context.map);

                if unit.distance_to(rally_point) > CREEP_RALLY_LEASH {
                    Some(Command::Move(rally_point))
                } else {
                    None
                }
            }
        }
    }

    /// Closest creep cell to `target`, or a valid cell next to it.
    fn find_closest_to_target(&self, target: Point2, context: &RoleContext) -> Option<Point2> {
        let closest = context.coverage.closest_creep_tile(target)?;

        if self.valid_placement(closest, context) {
            return Some(closest);
        }

        closest.neighbors8().into_iter().find(|p| self.valid_placement(*p, context))
    }

    /// Follow the ground path of the creep target to the first cell without creep, then place at the creep edge.
    fn find_closest_to_target_using_path(
        &self,
        target: &CreepTarget,
        terrain: &dyn TerrainOracle,
        context: &RoleContext,
    ) -> Option<Point2> {
        let (start, end) = target.endpoints(context.map);
        let path = terrain.pathfind(start, end, GridLayer::Ground, PATH_SENSITIVITY)?;
        let frontier = path.into_iter().find(|p| !context.observation.has_creep(*p))?;

        self.find_closest_to_target(frontier, context)
    }

    /// Orders every ready burrowed tumor to spread.
    pub fn spread_existing_tumors(&mut self, context: &mut RoleContext) {
        let observation = context.observation;
        let policy = context.policy;
        let game_loop = observation.game_loop;
        let time = observation.time;

        for tumor in observation.structures_of(UnitKind::CreepTumorBurrowed) {
            let tag = tumor.tag;

            if self.spent.contains(&tag) {
                continue;
            }

            if !tumor.is_idle() && matches!(tumor.order.map(|o| o.target), Some(Target::Point(_))) {
                self.spent.insert(tag);
                continue;
            }

            let started = match self.cooldown_started.get(&tag) {
                Some(started) => *started,
                None => {
                    self.cooldown_started.insert(tag, game_loop);
                    continue;
                }
            };

            if game_loop < started + TUMOR_COOLDOWN {
                continue;
            }

            let active_since = *self.active_since.entry(tag).or_insert(time);

            let placement = if policy.creep.spread_style == SpreadStyle::Targeted && active_since > time - TARGETED_SPREAD_WINDOW {
                self.find_existing_tumor_placement(tumor.position, context)
            } else {
                self.find_random_placement(tumor.position, policy.creep.distance_between_existing_tumors, context)
            };

            let position = match placement {
                Some(position) if self.valid_placement(position, context) => position,
                _ => continue,
            };

            self.cooldown_started.remove(&tag);
            self.active_since.remove(&tag);
            self.spent.insert(tag);
            self.commit(position, time);

            context
                .commands
                .issue(tag, Command::ability(Ability::BuildCreepTumorTumor, Target::Point(position)));
        }
    }

    /// Walk back from full spread range towards the tumor, aiming at the nearest cell without creep.
    fn find_existing_tumor_placement(&self, from: Point2, context: &RoleContext) -> Option<Point2> {
        let policy = &context.policy.creep;
        let target = context.coverage.closest_no_creep_tile(from)?;
        let furthest = policy.distance_between_existing_tumors;
        let steps = (furthest - policy.min_distance_between_existing_tumors).max(0.0) as u32;

        (0..steps)
            .map(|i| from.towards(target, furthest - i as f32))
            .find(|p| self.valid_placement(*p, context))
    }

    fn find_random_placement(&mut self, from: Point2, distance: f32, context: &RoleContext) -> Option<Point2> {
        let angle = self.rng.random_range(0.0..TAU);
        let start = from.polar_offset(angle, distance);

        if !context.map.in_map_bounds(start) {
            return None;
        }

        (0..RANDOM_WALK_STEPS)
            .map(|i| start.towards(from, i as f32))
            .find(|p| self.valid_placement(*p, context))
    }

    /// Forget placements that became tumors or never did in time.
    pub fn clear_pending(&mut self, observation: &Observation) {
        let time = observation.time;
        let tumors: Vec<Point2> = observation.creep_tumors().map(|t| t.position).collect();

        self.pending.retain(|(position, ordered_at)| {
            let landed = tumors
                .iter()
                .copied()
                .within_distance(*position, PENDING_TUMOR_RADIUS)
                .next()
                .is_some();

            !landed && time <= ordered_at + PENDING_TUMOR_TIMEOUT
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::micro::tests::Fixture;

    fn fixture() -> Fixture {
        let mut fixture = Fixture::new();
        fixture.observation.creep.fill_rect((10, 10), (30, 30), true);
        fixture.policy.creep.creep_targets = vec![CreepTarget::Point(Point2::new(40.5, 20.5))];
        fixture.coverage.update_map(&fixture.map, &fixture.observation);
        fixture
    }

    fn set_loop(fixture: &mut Fixture, game_loop: u32) {
        fixture.observation.game_loop = game_loop;
        fixture.observation.time = game_loop as f32 / GAME_LOOPS_PER_SECOND;
    }

    #[test]
    fn positions_snap_to_cell_centers() {
        assert_eq!(tumor_key(Point2::new(30.0, 40.2)), (61, 81));
        assert_eq!(tumor_key(Point2::new(30.5, 40.5)), (61, 81));
        assert_eq!(tumor_key(Point2::new(30.8, 12.3)), (63, 25));
    }

    #[test]
    fn placement_needs_creep_and_clearance() {
        let mut fixture = fixture();
        let planner = TumorPlanner::new(1);

        assert!(fixture.run(|context| planner.valid_placement(Point2::new(20.5, 20.5), context)));
        assert!(!fixture.run(|context| planner.valid_placement(Point2::new(40.5, 40.5), context)));

        fixture.observation.enemy_units = vec![Unit::new(9, UnitKind::Marine, Point2::new(25.0, 20.5)).with_weapons(5.0, 5.0)];
        assert!(!fixture.run(|context| planner.valid_placement(Point2::new(20.5, 20.5), context)));

        fixture.observation.enemy_units = vec![Unit::new(9, UnitKind::Scv, Point2::new(25.0, 20.5)).with_weapons(0.1, 0.0)];
        assert!(fixture.run(|context| planner.valid_placement(Point2::new(20.5, 20.5), context)));

        fixture.map.expansions = vec![Point2::new(22.5, 20.5)];
        assert!(!fixture.run(|context| planner.valid_placement(Point2::new(20.5, 20.5), context)));

        fixture.policy.creep.should_tumors_block_expansions = true;
        assert!(fixture.run(|context| planner.valid_placement(Point2::new(20.5, 20.5), context)));
    }

    #[test]
    fn queen_places_at_creep_edge_towards_target() {
        let mut fixture = fixture();
        let mut planner = TumorPlanner::new(1);
        let queen = Unit::queen(1, Point2::new(20.0, 20.0)).with_energy(25.0);

        let command = fixture.run(|context| planner.spread_creep(&queen, context));

        assert_eq!(
            command,
            Some(Command::ability(Ability::BuildCreepTumorQueen, Target::Point(Point2::new(29.5, 20.5))))
        );
        assert_eq!(planner.pending().len(), 1);
        assert_eq!(planner.target_index(), 1);
    }

    #[test]
    fn crowded_placement_sends_queen_to_rally() {
        let mut fixture = fixture();
        fixture.observation.structures = vec![Unit::new(50, UnitKind::CreepTumorBurrowed, Point2::new(27.5, 20.5))];
        let mut planner = TumorPlanner::new(1);
        let queen = Unit::queen(1, Point2::new(20.0, 20.0)).with_energy(25.0);

        let command = fixture.run(|context| planner.spread_creep(&queen, context));

        assert_eq!(command, Some(Command::Move(Point2::new(8.5, 8.5))));
        assert_eq!(planner.target_index(), 1);
        assert!(planner.pending().is_empty());
    }

    #[test]
    fn pending_placement_keeps_next_queen_away() {
        let mut fixture = fixture();
        let mut planner = TumorPlanner::new(1);
        let first = Unit::queen(1, Point2::new(20.0, 20.0)).with_energy(25.0);
        let second = Unit::queen(2, Point2::new(21.0, 20.0)).with_energy(25.0);
        let beside = Point2::new(29.5, 24.5);

        assert!(fixture.run(|context| planner.valid_placement(beside, context)));

        fixture.run(|context| planner.spread_creep(&first, context));

        assert!(!fixture.run(|context| planner.valid_placement(beside, context)));
        assert_eq!(
            fixture.run(|context| planner.spread_creep(&second, context)),
            Some(Command::Move(Point2::new(8.5, 8.5)))
        );
        assert_eq!(planner.pending().len(), 1);
    }

    #[test]
    fn tumors_spreading_together_keep_spacing() {
        let mut fixture = Fixture::new();
        fixture.observation.creep.fill_rect((2, 2), (62, 40), true);
        fixture.coverage.update_map(&fixture.map, &fixture.observation);
        fixture.observation.structures = vec![
            Unit::new(50, UnitKind::CreepTumorBurrowed, Point2::new(20.5, 25.5)),
            Unit::new(51, UnitKind::CreepTumorBurrowed, Point2::new(26.5, 25.5)),
        ];
        let mut planner = TumorPlanner::new(1);
        let spacing = fixture.policy.creep.distance_between_queen_tumors;

        fixture.run(|context| planner.spread_existing_tumors(context));
        set_loop(&mut fixture, TUMOR_COOLDOWN);
        fixture.run(|context| planner.spread_existing_tumors(context));

        let placed: Vec<Point2> = fixture
            .commands
            .iter()
            .filter_map(|(_, command)| match command {
                Command::UseAbility { target: Target::Point(point), .. } => Some(*point),
                _ => None,
            })
            .collect();

        assert_eq!(placed.len(), 1);
        assert_eq!(planner.pending().len(), 1);

        for (i, a) in placed.iter().enumerate() {
            for b in placed.iter().skip(i + 1) {
                assert!(a.distance_to(*b) >= spacing, "{:?} and {:?} too close", a, b);
            }
        }
    }

    #[test]
    fn pending_positions_expire() {
        let mut fixture = fixture();
        let mut planner = TumorPlanner::new(1);
        let queen = Unit::queen(1, Point2::new(20.0, 20.0)).with_energy(25.0);

        fixture.run(|context| planner.spread_creep(&queen, context));

        fixture.observation.time = 5.0;
        planner.clear_pending(&fixture.observation);
        assert_eq!(planner.pending().len(), 1);

        fixture.observation.time = 10.5;
        planner.clear_pending(&fixture.observation);
        assert!(planner.pending().is_empty());
    }

    #[test]
    fn pending_positions_clear_when_tumor_lands() {
        let mut fixture = fixture();
        let mut planner = TumorPlanner::new(1);
        let queen = Unit::queen(1, Point2::new(20.0, 20.0)).with_energy(25.0);

        fixture.run(|context| planner.spread_creep(&queen, context));

        fixture.observation.structures = vec![Unit::new(50, UnitKind::CreepTumorQueen, Point2::new(29.5, 21.5))];
        planner.clear_pending(&fixture.observation);
        assert!(planner.pending().is_empty());
    }

    #[test]
    fn first_tumor_retries_then_moves_on() {
        let mut fixture = fixture();
        fixture.policy.creep.first_tumor_position = Some(Point2::new(15.5, 15.5));
        let mut planner = TumorPlanner::new(1);
        let queen = Unit::queen(1, Point2::new(20.0, 20.0)).with_energy(25.0);
        let first = Some(Command::ability(Ability::BuildCreepTumorQueen, Target::Point(Point2::new(15.5, 15.5))));

        for _ in 0..FIRST_TUMOR_RETRIES {
            assert_eq!(fixture.run(|context| planner.spread_creep(&queen, context)), first);
        }

        assert_eq!(
            fixture.run(|context| planner.spread_creep(&queen, context)),
            Some(Command::ability(Ability::BuildCreepTumorQueen, Target::Point(Point2::new(29.5, 20.5))))
        );
    }

    #[test]
    fn unusable_first_tumor_is_dropped() {
        let mut fixture = fixture();
        fixture.policy.creep.first_tumor_position = Some(Point2::new(50.5, 50.5));
        let mut planner = TumorPlanner::new(1);
        let queen = Unit::queen(1, Point2::new(20.0, 20.0)).with_energy(25.0);

        assert_eq!(fixture.run(|context| planner.spread_creep(&queen, context)), None);
        assert!(matches!(
            fixture.run(|context| planner.spread_creep(&queen, context)),
            Some(Command::UseAbility { ability: Ability::BuildCreepTumorQueen, .. })
        ));
    }

    #[test]
    fn burrowed_tumor_spreads_after_cooldown() {
        let mut fixture = fixture();
        fixture.observation.structures = vec![Unit::new(50, UnitKind::CreepTumorBurrowed, Point2::new(20.5, 20.5))];
        let mut planner = TumorPlanner::new(1);

        fixture.run(|context| planner.spread_existing_tumors(context));
        set_loop(&mut fixture, 200);
        fixture.run(|context| planner.spread_existing_tumors(context));
        assert!(fixture.commands.is_empty());

        set_loop(&mut fixture, TUMOR_COOLDOWN);
        fixture.run(|context| planner.spread_existing_tumors(context));

        assert_eq!(fixture.commands.len(), 1);
        match fixture.commands[0] {
            (50, Command::UseAbility { ability: Ability::BuildCreepTumorTumor, target: Target::Point(point) }) => {
                assert!(fixture.observation.has_creep(point));
                assert!(point.distance_to(Point2::new(20.5, 20.5)) >= 7.0);
            }
            ref other => panic!("unexpected {:?}", other),
        }
        assert!(planner.is_spent(50));

        set_loop(&mut fixture, TUMOR_COOLDOWN + 8);
        fixture.run(|context| planner.spread_existing_tumors(context));
        assert_eq!(fixture.commands.len(), 1);
    }

    #[test]
    fn random_spread_stays_on_creep() {
        let mut fixture = fixture();
        fixture.policy.creep.spread_style = SpreadStyle::Random;
        fixture.policy.creep.distance_between_existing_tumors = 8.0;
        fixture.observation.structures = vec![Unit::new(50, UnitKind::CreepTumorBurrowed, Point2::new(20.5, 20.5))];
        let mut planner = TumorPlanner::new(7);

        fixture.run(|context| planner.spread_existing_tumors(context));
        set_loop(&mut fixture, TUMOR_COOLDOWN);
        fixture.run(|context| planner.spread_existing_tumors(context));

        for (_, command) in fixture.commands.iter() {
            if let Command::UseAbility { target: Target::Point(point), .. } = command {
                assert!(fixture.observation.has_creep(*point));
            }
        }
    }
}
