use super::micro::*;
use super::tumors::*;
use super::*;
use crate::constants::*;

/// Spreads creep towards the configured targets, defending only when nothing else needs doing.
pub struct CreepSpread {
    planner: TumorPlanner,
}

impl CreepSpread {
    pub fn new(seed: u64) -> CreepSpread {
        CreepSpread {
            planner: TumorPlanner::new(seed),
        }
    }

    pub fn planner(&self) -> &TumorPlanner {
        &self.planner
    }

    pub fn planner_mut(&mut self) -> &mut TumorPlanner {
        &mut self.planner
    }

    /// Enemies that can hit a queen walking out to place a tumor.
    fn cast_interrupted(unit: &Unit, context: &RoleContext) -> bool {
        let reach = unit.air_range.max(unit.ground_range) + CAST_ABORT_PADDING;

        context
            .observation
            .enemy_units
            .iter()
            .any(|enemy| enemy.can_attack_ground() && enemy.kind != UnitKind::Overlord && enemy.distance_to(unit.position) < reach)
    }
}

impl RoleBehavior for CreepSpread {
    fn handle(&mut self, unit: &Unit, _assignment: &Assignment, context: &mut RoleContext) -> Option<Command> {
        let policy = &context.policy.creep;

        if let Some(command) = keep_safe(unit, context) {
            return Some(command);
        }

        let has_energy = unit.energy >= CREEP_TUMOR_ENERGY_COST;
        let should_spread = has_energy && policy.prioritize_creep.evaluate(context.observation);
        let casting = unit.is_using(Ability::BuildCreepTumorQueen);

        let min_priority = if should_spread { 2 } else { 1 };

        if let Some(priority) = context.priority_threats().filter(|p| p.len() >= min_priority) {
            return engage(unit, priority, true, context);
        }

        if !context.spatial.enemies_in_attack_range_of(unit, ATTACK_RANGE_BONUS).is_empty() {
            return engage(unit, &context.observation.enemy_units, false, context);
        }

        if policy.defend_against_air && !context.threats.air.is_empty() && !should_spread {
            return engage(unit, &context.threats.air, false, context);
        }

        if policy.defend_against_ground && !context.threats.ground.is_empty() && !should_spread {
            return engage(unit, &context.threats.ground, false, context);
        }

        if casting && Self::cast_interrupted(unit, context) {
            return Some(Command::Move(policy.rally_point(context.map)));
        }

        if has_energy && !casting && context.coverage.percentage() < policy.target_perc_coverage {
            return self.planner.spread_creep(unit, context);
        }

        if casting {
            return None;
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
