use super::micro::*;
use super::*;
use crate::constants::*;

/// Holds the bases, and pushes out when the attack condition says so.
#[derive(Default)]
pub struct Defence;

impl RoleBehavior for Defence {
    fn handle(&mut self, unit: &Unit, _assignment: &Assignment, context: &mut RoleContext) -> Option<Command> {
        let policy = &context.policy.defence;

        if let Some(command) = keep_safe(unit, context) {
            return Some(command);
        }

        if let Some(priority) = context.priority_threats() {
            return engage(unit, priority, false, context);
        }

        if policy.attack_condition.evaluate(context.observation) {
            return offensive_micro(unit, policy.attack_target(context.map), context);
        }

        if !context.spatial.enemies_in_attack_range_of(unit, ATTACK_RANGE_BONUS).is_empty() {
            return engage(unit, context.spatial.units(UnitSet::Enemy), false, context);
        }

        if policy.defend_against_ground && !context.threats.ground.is_empty() {
            return engage(unit, &context.threats.ground, false, context);
        }

        if policy.defend_against_air && !context.threats.air.is_empty() {
            return engage(unit, &context.threats.air, true, context);
        }

        if let Some(terrain) = context.terrain {
            if !terrain.is_position_safe(unit.position, GridLayer::Ground) {
                return Some(move_towards_safe_spot(unit, GridLayer::Ground, context));
            }
        }

        let rally_point = policy.rally_point(context.map);

        if unit.distance_to(rally_point) > RALLY_RADIUS {
            return Some(Command::Move(rally_point));
        }

        None
    }
}
