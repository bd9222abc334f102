use super::micro::*;
use super::*;
use crate::constants::*;
use crate::findnearest::*;
use crate::geometry::*;

/// Keeps a bound townhall injected and stays near it between casts.
#[derive(Default)]
pub struct Inject;

impl Inject {
    fn between_injects(unit: &Unit, townhall: &Unit, context: &RoleContext) -> Option<Command> {
        if unit.distance_to(townhall.position) > INJECT_LEASH {
            return Some(Command::Move(townhall.position));
        }

        // Only look for close enemies when something is already attacking the bases.
        if !context.threats.is_empty() {
            let close: Vec<&Unit> = context
                .observation
                .enemy_units
                .iter()
                .within_distance(townhall.position, INJECT_DEFEND_RADIUS)
                .collect();

            if !close.is_empty() {
                return engage(unit, close, true, context);
            }
        }

        if context.observation.game_loop % MINERAL_LINE_NUDGE_INTERVAL == 0 {
            let mineral_line = Point2::center(
                context
                    .observation
                    .mineral_fields
                    .iter()
                    .within_distance(townhall.position, MINERAL_LINE_RADIUS)
                    .map(|m| m.position),
            );

            if let Some(center) = mineral_line {
                if unit.distance_to(center) < MINERAL_LINE_NUDGE_RADIUS {
                    return Some(Command::Move(unit.position.towards(center, -1.0)));
                }
            }
        }

        None
    }
}

impl RoleBehavior for Inject {
    fn handle(&mut self, unit: &Unit, assignment: &Assignment, context: &mut RoleContext) -> Option<Command> {
        let policy = &context.policy.inject;

        if let Some(command) = keep_safe(unit, context) {
            return Some(command);
        }

        let townhall_tag = assignment.townhall()?;
        let townhall = context.observation.ready_townhalls().find(|t| t.tag == townhall_tag)?;

        if let Some(priority) = context.priority_threats() {
            return engage(unit, priority, true, context);
        }

        if policy.defend_against_ground && !context.threats.ground.is_empty() {
            return engage(unit, &context.threats.ground, true, context);
        }

        if policy.defend_against_air && !context.threats.air.is_empty() {
            return engage(unit, &context.threats.air, true, context);
        }

        if unit.energy >= INJECT_ENERGY_COST {
            return Some(Command::ability(Ability::InjectLarva, Target::Unit(townhall.tag)));
        }

        Self::between_injects(unit, townhall, context)
    }
}
