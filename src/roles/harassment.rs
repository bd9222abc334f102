use super::micro::*;
use super::*;
use crate::constants::*;
use crate::findnearest::*;

/// Takes queens through the nydus network and fights on the far side. There is no way back.
#[derive(Default)]
pub struct Harassment;

impl Harassment {
    fn tumors_near(unit: &Unit, context: &RoleContext) -> usize {
        context
            .observation
            .structures
            .iter()
            .filter(|s| matches!(s.kind, UnitKind::CreepTumorBurrowed | UnitKind::CreepTumorQueen))
            .within_distance(unit.position, HARASS_TUMOR_RADIUS)
            .count()
    }
}

impl RoleBehavior for Harassment {
    fn handle(&mut self, unit: &Unit, _assignment: &Assignment, context: &mut RoleContext) -> Option<Command> {
        let policy = &context.policy.harassment;
        let observation = context.observation;

        if let Some(command) = keep_safe(unit, context) {
            return Some(command);
        }

        let nydus_target = policy.nydus_target(context.map);

        let canal = observation
            .structures_of(UnitKind::NydusCanal)
            .find_nearest_linear(nydus_target)?;
        let network = observation
            .structures_of(UnitKind::NydusNetwork)
            .find_nearest_linear(context.map.start_location)?;

        // Wait next to the network until the canal pops.
        if !canal.is_ready() && unit.distance_to(canal.position) > CANAL_WAIT_DISTANCE {
            return Some(Command::Move(network.position));
        }

        if unit.distance_to(nydus_target) > NYDUS_BOARD_DISTANCE && unit.distance_to(network.position) < NYDUS_NETWORK_REACH {
            return Some(Command::ability(Ability::Smart, Target::Unit(network.tag)));
        }

        let casting = unit.is_using(Ability::BuildCreepTumorQueen);

        if !casting
            && unit.energy >= HARASS_TUMOR_ENERGY
            && observation.has_creep(unit.position)
            && Self::tumors_near(unit, context) < HARASS_TUMOR_LIMIT
        {
            return Some(Command::ability(Ability::BuildCreepTumorQueen, Target::Point(unit.position)));
        }

        if casting {
            return None;
        }

        let in_range = context.spatial.enemies_in_attack_range_of(unit, ATTACK_RANGE_BONUS);

        if let Some(target) = select_target(&in_range) {
            if attack_ready(unit, target, observation.game_step) {
                return Some(Command::attack_unit(target.tag));
            }

            if context.terrain.is_some() {
                return Some(move_towards_safe_spot(unit, GridLayer::Ground, context));
            }

            return step_out_of_range(unit, target, 0.0, context);
        }

        if !observation.is_visible(nydus_target) {
            return Some(Command::Move(nydus_target));
        }

        offensive_micro(unit, policy.attack_target(context.map), context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::*;
    use crate::roles::micro::tests::Fixture;

    const NETWORK: Tag = 60;
    const CANAL: Tag = 61;

    fn fixture(canal_ready: bool) -> Fixture {
        let mut fixture = Fixture::new();
        let mut canal = Unit::new(CANAL, UnitKind::NydusCanal, Point2::new(50.0, 50.0));
        if !canal_ready {
            canal = canal.without_flags(UnitFlags::READY);
        }
        fixture.observation.structures = vec![Unit::new(NETWORK, UnitKind::NydusNetwork, Point2::new(12.0, 12.0)), canal];
        fixture
    }

    fn handle(fixture: &mut Fixture, unit: &Unit) -> Option<Command> {
        fixture.run(|context| Harassment.handle(unit, &Assignment::Harassment, context))
    }

    #[test]
    fn nothing_to_do_without_nydus() {
        let mut fixture = Fixture::new();
        let queen = Unit::queen(1, Point2::new(10.0, 10.0));

        assert_eq!(handle(&mut fixture, &queen), None);
    }

    #[test]
    fn waits_at_network_while_canal_builds() {
        let mut fixture = fixture(false);
        let queen = Unit::queen(1, Point2::new(20.0, 10.0));

        assert_eq!(handle(&mut fixture, &queen), Some(Command::Move(Point2::new(12.0, 12.0))));
    }

    #[test]
    fn boards_network_when_canal_is_up() {
        let mut fixture = fixture(true);
        let queen = Unit::queen(1, Point2::new(20.0, 10.0));

        assert_eq!(
            handle(&mut fixture, &queen),
            Some(Command::ability(Ability::Smart, Target::Unit(NETWORK)))
        );
    }

    #[test]
    fn fights_on_the_far_side() {
        let mut fixture = fixture(true);
        fixture.observation.enemy_units = vec![
            Unit::new(8, UnitKind::Marine, Point2::new(53.0, 52.0)),
            Unit::new(9, UnitKind::Viking, Point2::new(51.0, 55.0)).with_flags(UnitFlags::FLYING),
        ];
        let queen = Unit::queen(1, Point2::new(51.0, 51.0));

        assert_eq!(handle(&mut fixture, &queen), Some(Command::attack_unit(9)));
    }

    #[test]
    fn advances_on_target_when_clear() {
        let mut fixture = fixture(true);
        let queen = Unit::queen(1, Point2::new(51.0, 51.0));

        assert_eq!(handle(&mut fixture, &queen), Some(Command::attack_move(Point2::new(56.5, 56.5))));

        fixture.observation.visibility.fill_rect((54, 54), (60, 60), false);
        assert_eq!(handle(&mut fixture, &queen), Some(Command::Move(Point2::new(56.5, 56.5))));
    }

    #[test]
    fn plants_tumor_with_spare_energy() {
        let mut fixture = fixture(true);
        fixture.observation.creep.fill_rect((45, 45), (60, 60), true);
        let queen = Unit::queen(1, Point2::new(51.5, 51.5)).with_energy(80.0);

        assert_eq!(
            handle(&mut fixture, &queen),
            Some(Command::ability(Ability::BuildCreepTumorQueen, Target::Point(Point2::new(51.5, 51.5))))
        );

        let drained = queen.with_energy(60.0);
        assert_eq!(handle(&mut fixture, &drained), Some(Command::attack_move(Point2::new(56.5, 56.5))));
    }
}
