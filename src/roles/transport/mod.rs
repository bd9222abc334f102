//! Covert creep insertion: an overlord carrier ferries a queen to a far expansion, where the
//! queen plants a tumor before moving on to the next expansion.

pub mod carrier;
pub mod passenger;

use self::carrier::*;
use self::passenger::*;
use super::micro::*;
use super::*;
use crate::constants::*;
use crate::findnearest::*;
use crate::geometry::*;
use crate::machine_tick::*;
use log::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::f32::consts::TAU;

/// State shared by the carrier and passenger machines.
#[derive(Clone, Debug, Default)]
pub struct TransportContext {
    pub carrier: Option<Tag>,
    target_index: Option<usize>,
    pub current_target: Option<Point2>,
    pub unloaded_at: Option<f32>,
}

impl TransportContext {
    /// Loading is held off for a moment after an unload so the queen can get its tumor order in.
    pub fn loading_locked(&self, time: f32) -> bool {
        self.unloaded_at.map(|at| time <= at + CARRIER_LOAD_LOCK).unwrap_or(false)
    }

    /// Rotate to the next target expansion and pick a landing spot next to it.
    pub fn next_target(&mut self, rng: &mut StdRng, context: &RoleContext) {
        let expansions = &context.policy.transport.target_expansions;

        if expansions.is_empty() {
            self.current_target = None;
            return;
        }

        let index = self.target_index.map(|i| (i + 1) % expansions.len()).unwrap_or(0);
        let area = expansions[index];
        let height = context.map.terrain_height(area);

        self.target_index = Some(index);

        let landing = (0..TRANSPORT_TARGET_SAMPLES)
            .map(|_| area.polar_offset(rng.random_range(0.0..TAU), TRANSPORT_TARGET_OFFSET))
            .filter(|p| {
                context
                    .terrain
                    .map(|terrain| terrain.is_position_safe(*p, GridLayer::Ground))
                    .unwrap_or(true)
            })
            .find(|p| context.map.terrain_height(*p) == height && context.map.in_pathing_grid(*p));

        self.current_target = Some(landing.unwrap_or_else(|| context.map.center()));

        debug!("Transport target {:?} for expansion {:?}", self.current_target, area);
    }
}

/// Next waypoint towards `to`, or `to` itself without terrain data.
fn path_step(from: Point2, to: Point2, layer: GridLayer, sensitivity: usize, context: &RoleContext) -> Point2 {
    context
        .terrain
        .and_then(|terrain| terrain.pathfind(from, to, layer, sensitivity))
        .and_then(|path| path.first().copied())
        .unwrap_or(to)
}

/// Pathable ground with no creep anywhere near it, worth dropping the queen on straight away.
fn area_without_creep(position: Point2, context: &RoleContext) -> bool {
    let map = context.map;

    if !map.in_pathing_grid(position) || context.observation.has_creep(position) {
        return false;
    }

    if map
        .expansions
        .iter()
        .copied()
        .within_distance(position, BLOCK_EXPANSION_RADIUS)
        .next()
        .is_some()
    {
        return false;
    }

    if let Some(terrain) = context.terrain {
        if !terrain.is_position_safe(position, GridLayer::Ground) {
            return false;
        }
    }

    context
        .coverage
        .closest_creep_tile(position)
        .map(|tile| tile.distance_to(position) > TRANSPORT_CREEP_CLEARANCE)
        .unwrap_or(true)
}

/// Drives the carrier and the passenger of the transport role.
pub struct Transport {
    context: TransportContext,
    carrier_state: CarrierState,
    passenger_state: PassengerState,
    rng: StdRng,
}

impl Transport {
    pub fn new(seed: u64) -> Transport {
        Transport {
            context: TransportContext::default(),
            carrier_state: CarrierState::idle(),
            passenger_state: PassengerState::approach(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn carrier(&self) -> Option<Tag> {
        self.context.carrier
    }

    pub fn current_target(&self) -> Option<Point2> {
        self.context.current_target
    }

    pub fn carrier_state(&self) -> &CarrierState {
        &self.carrier_state
    }

    pub fn passenger_state(&self) -> &PassengerState {
        &self.passenger_state
    }

    /// Forget a dead carrier.
    pub fn forget(&mut self, tag: Tag) {
        if self.context.carrier == Some(tag) {
            self.drop_carrier();
        }
    }

    fn drop_carrier(&mut self) {
        self.context.carrier = None;
        self.carrier_state = CarrierState::idle();
    }

    fn ensure_target(&mut self, context: &RoleContext) -> bool {
        if context.policy.transport.target_expansions.is_empty() {
            return false;
        }

        if self.context.current_target.is_none() {
            self.context.next_target(&mut self.rng, context);
        }

        self.context.current_target.is_some()
    }

    fn select_carrier<'a>(reserved: &HashSet<Tag>, context: &RoleContext<'a>) -> Option<&'a Unit> {
        context
            .observation
            .units
            .iter()
            .filter(|u| {
                matches!(u.kind, UnitKind::Overlord | UnitKind::OverlordTransport)
                    && u.health_percentage() > CARRIER_MIN_HEALTH
                    && !reserved.contains(&u.tag)
            })
            .find_nearest_linear(context.map.start_location)
    }

    /// Once per tick: acquire, morph and fly the carrier. `passenger` is the transport queen, if visible.
    pub fn manage_carrier(&mut self, passenger: Option<&Unit>, reserved: &HashSet<Tag>, context: &mut RoleContext) {
        if !self.ensure_target(context) {
            return;
        }

        let observation = context.observation;

        let carrier = match self.context.carrier.and_then(|tag| observation.own_unit(tag)) {
            Some(carrier) => carrier,
            None => {
                if let Some(overlord) = Self::select_carrier(reserved, context) {
                    debug!("Overlord {} picked as transport carrier", overlord.tag);

                    self.context.carrier = Some(overlord.tag);
                    self.carrier_state = CarrierState::idle();
                }
                return;
            }
        };

        match carrier.kind {
            UnitKind::Overseer => {
                debug!("Transport carrier {} became an overseer", carrier.tag);
                self.drop_carrier();
                return;
            }
            UnitKind::OverlordTransport => {}
            _ => {
                if carrier.kind == UnitKind::Overlord
                    && observation.minerals >= TRANSPORT_MORPH_MINERALS
                    && observation.vespene >= TRANSPORT_MORPH_VESPENE
                {
                    context
                        .commands
                        .issue(carrier.tag, Command::ability(Ability::MorphOverlordTransport, Target::None));
                }
                return;
            }
        }

        if !carrier.flags.contains(UnitFlags::GENERATING_CREEP) {
            context
                .commands
                .issue(carrier.tag, Command::ability(Ability::GenerateCreepOn, Target::None));
        }

        if carrier.health_percentage() < CARRIER_RETREAT_HEALTH {
            debug!("Transport carrier {} is dying, unloading", carrier.tag);

            context
                .commands
                .issue(carrier.tag, Command::ability(Ability::UnloadAllAt, Target::Point(carrier.position)));
            self.context.unloaded_at = Some(observation.time);
            self.drop_carrier();
            return;
        }

        let mut tick_context = CarrierTickContext {
            carrier,
            passenger,
            role: context,
        };

        let state_context = &mut self.context;

        run_state_machine(&mut self.carrier_state, "carrier", |state| {
            state.tick(state_context, &mut tick_context)
        });
    }
}

impl RoleBehavior for Transport {
    fn handle(&mut self, unit: &Unit, _assignment: &Assignment, context: &mut RoleContext) -> Option<Command> {
        if let Some(command) = keep_safe(unit, context) {
            return Some(command);
        }

        if !self.ensure_target(context) {
            return None;
        }

        let observation = context.observation;
        let carrier = self.context.carrier.and_then(|tag| observation.own_unit(tag));

        let mut tick_context = PassengerTickContext {
            unit,
            carrier,
            role: context,
            rng: &mut self.rng,
            command: None,
        };

        let state_context = &mut self.context;

        run_state_machine(&mut self.passenger_state, "passenger", |state| {
            state.tick(state_context, &mut tick_context)
        });

        tick_context.command
    }
}
