use super::*;
use screeps_machine::*;

const BOARDING_PATH_SENSITIVITY: usize = 5;

pub struct PassengerTickContext<'t, 'a> {
    pub unit: &'t Unit,
    pub carrier: Option<&'a Unit>,
    pub role: &'t mut RoleContext<'a>,
    pub rng: &'t mut StdRng,
    pub command: Option<Command>,
}

impl<'t, 'a> PassengerTickContext<'t, 'a> {
    fn aboard(&self) -> bool {
        self.carrier.map(|c| c.passengers.contains(&self.unit.tag)).unwrap_or(false)
    }
}

machine!(
    #[derive(Clone, Debug)]
    enum PassengerState {
        Approach,
        Boarded,
        Disembarked,
    }

    impl {
        * => fn status_description(&self) -> String {
            std::any::type_name::<Self>().to_string()
        }

        _ => fn tick(&mut self, state_context: &mut TransportContext, tick_context: &mut PassengerTickContext) -> Option<PassengerState>;
    }
);

impl Approach {
    pub fn tick(&mut self, state_context: &mut TransportContext, tick_context: &mut PassengerTickContext) -> Option<PassengerState> {
        if tick_context.aboard() {
            return Some(PassengerState::boarded());
        }

        let unit = tick_context.unit;

        if unit.is_using(Ability::BuildCreepTumorQueen) {
            return None;
        }

        let target = state_context.current_target?;

        if unit.distance_to(target) < TRANSPORT_PLACEMENT_RANGE {
            return Some(PassengerState::disembarked());
        }

        let context = &mut *tick_context.role;

        tick_context.command = match tick_context.carrier {
            Some(carrier)
                if carrier.kind == UnitKind::OverlordTransport
                    && carrier.is_ready()
                    && !state_context.loading_locked(context.observation.time) =>
            {
                if unit.distance_to(carrier.position) < CARRIER_LOAD_RANGE {
                    Some(Command::ability(Ability::Smart, Target::Unit(carrier.tag)))
                } else {
                    Some(Command::Move(path_step(
                        unit.position,
                        carrier.position,
                        GridLayer::Ground,
                        BOARDING_PATH_SENSITIVITY,
                        context,
                    )))
                }
            }
            Some(_) => None,
            None => Some(move_towards_safe_spot(unit, GridLayer::Ground, context)),
        };

        None
    }
}

impl Boarded {
    /// Carried passively. Only reached again once the queen is visible, which means the queen is out again.
    pub fn tick(&mut self, state_context: &mut TransportContext, tick_context: &mut PassengerTickContext) -> Option<PassengerState> {
        if tick_context.aboard() {
            return None;
        }

        let near_target = state_context
            .current_target
            .map(|target| tick_context.unit.distance_to(target) < TRANSPORT_PLACEMENT_RANGE)
            .unwrap_or(false);

        if near_target {
            Some(PassengerState::disembarked())
        } else {
            Some(PassengerState::approach())
        }
    }
}

impl Disembarked {
    pub fn tick(&mut self, state_context: &mut TransportContext, tick_context: &mut PassengerTickContext) -> Option<PassengerState> {
        let unit = tick_context.unit;

        if unit.is_using(Ability::BuildCreepTumorQueen) {
            return None;
        }

        let target = state_context.current_target?;

        if unit.distance_to(target) >= TRANSPORT_PLACEMENT_RANGE {
            return Some(PassengerState::approach());
        }

        let context = &mut *tick_context.role;

        if unit.energy >= CREEP_TUMOR_ENERGY_COST && context.observation.has_creep(target) {
            tick_context.command = Some(Command::ability(Ability::BuildCreepTumorQueen, Target::Point(target)));

            state_context.next_target(tick_context.rng, context);

            return None;
        }

        let unsafe_here = context
            .terrain
            .map(|terrain| !terrain.is_position_safe(unit.position, GridLayer::Ground))
            .unwrap_or(false);

        tick_context.command = if unsafe_here && context.spatial.enemies_in_attack_range_of(unit, ATTACK_RANGE_BONUS).is_empty() {
            Some(move_towards_safe_spot(unit, GridLayer::Ground, context))
        } else {
            offensive_micro(unit, target, context)
        };

        None
    }
}
