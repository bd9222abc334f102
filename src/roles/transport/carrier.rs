use super::*;
use screeps_machine::*;

const CARRIER_PATH_SENSITIVITY: usize = 2;
const PICKUP_PATH_SENSITIVITY: usize = 5;

pub struct CarrierTickContext<'t, 'a> {
    pub carrier: &'a Unit,
    pub passenger: Option<&'t Unit>,
    pub role: &'t mut RoleContext<'a>,
}

machine!(
    #[derive(Clone, Debug)]
    enum CarrierState {
        Idle,
        SeekingPassenger,
        InTransit,
        Unloading,
    }

    impl {
        * => fn status_description(&self) -> String {
            std::any::type_name::<Self>().to_string()
        }

        _ => fn tick(&mut self, state_context: &mut TransportContext, tick_context: &mut CarrierTickContext) -> Option<CarrierState>;
    }
);

impl Idle {
    pub fn tick(&mut self, _state_context: &mut TransportContext, tick_context: &mut CarrierTickContext) -> Option<CarrierState> {
        if tick_context.carrier.kind == UnitKind::OverlordTransport {
            Some(CarrierState::seeking_passenger())
        } else {
            None
        }
    }
}

impl SeekingPassenger {
    pub fn tick(&mut self, state_context: &mut TransportContext, tick_context: &mut CarrierTickContext) -> Option<CarrierState> {
        let carrier = tick_context.carrier;

        if carrier.kind != UnitKind::OverlordTransport {
            return Some(CarrierState::idle());
        }

        if carrier.cargo_used > 0 {
            return Some(CarrierState::in_transit());
        }

        let passenger = tick_context.passenger?;
        let context = &mut *tick_context.role;

        if !carrier.is_ready() || !carrier.passengers.is_empty() || passenger.is_using(Ability::BuildCreepTumorQueen) {
            return None;
        }

        if carrier.distance_to(passenger.position) > CARRIER_LOAD_RANGE {
            let waypoint = path_step(carrier.position, passenger.position, GridLayer::Air, PICKUP_PATH_SENSITIVITY, context);

            context.commands.issue(carrier.tag, Command::Move(waypoint));
        } else if !state_context.loading_locked(context.observation.time) {
            context
                .commands
                .issue(carrier.tag, Command::ability(Ability::LoadOverlord, Target::Unit(passenger.tag)));
        }

        None
    }
}

impl InTransit {
    pub fn tick(&mut self, state_context: &mut TransportContext, tick_context: &mut CarrierTickContext) -> Option<CarrierState> {
        let carrier = tick_context.carrier;
        let context = &mut *tick_context.role;

        if carrier.cargo_used == 0 {
            return Some(CarrierState::seeking_passenger());
        }

        let target = state_context.current_target?;

        if carrier.distance_to(target) <= 1.0 {
            return Some(CarrierState::unloading());
        }

        // Already over empty ground: drop here rather than fly on.
        if area_without_creep(carrier.position, context) {
            state_context.current_target = Some(carrier.position);

            return Some(CarrierState::unloading());
        }

        let waypoint = path_step(carrier.position, target, GridLayer::Air, CARRIER_PATH_SENSITIVITY, context);

        context.commands.issue(carrier.tag, Command::Move(waypoint));

        None
    }
}

impl Unloading {
    pub fn tick(&mut self, state_context: &mut TransportContext, tick_context: &mut CarrierTickContext) -> Option<CarrierState> {
        let carrier = tick_context.carrier;
        let context = &mut *tick_context.role;

        if carrier.cargo_used == 0 {
            return Some(CarrierState::seeking_passenger());
        }

        let drop_at = state_context.current_target.unwrap_or(carrier.position);

        context
            .commands
            .issue(carrier.tag, Command::ability(Ability::UnloadAllAt, Target::Point(drop_at)));

        state_context.unloaded_at = Some(context.observation.time);

        None
    }
}
