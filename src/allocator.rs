//! Role assignment and the per-tick driver for the queen pool.

use super::commands::*;
use super::constants::*;
use super::coverage::*;
use super::findnearest::*;
use super::geometry::*;
use super::pathing::*;
use super::policy::*;
use super::roles::creep::*;
use super::roles::defence::*;
use super::roles::harassment::*;
use super::roles::inject::*;
use super::roles::micro::*;
use super::roles::transport::*;
use super::roles::*;
use super::spatial::*;
use super::threat::*;
use super::unit::*;
use super::world::*;
use itertools::*;
use log::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

const ROLES: [Role; 5] = [Role::Creep, Role::Defense, Role::Inject, Role::Transport, Role::Harassment];

/// Per tick extras supplied by the caller.
#[derive(Default)]
pub struct TickInput<'a> {
    /// Used instead of the internal assessment when the defence policy passes its own threats.
    pub threats: Option<ThreatSet>,
    /// Restrict management to these units. Defaults to every queen in the observation.
    pub units: Option<&'a [Unit]>,
    pub terrain: Option<&'a dyn TerrainOracle>,
    /// Overlords the caller is using for something else.
    pub reserved_carriers: HashSet<Tag>,
}

struct Behaviors {
    creep: CreepSpread,
    defence: Defence,
    inject: Inject,
    transport: Transport,
    harassment: Harassment,
}

impl Behaviors {
    fn new(seed: u64) -> Behaviors {
        Behaviors {
            creep: CreepSpread::new(seed),
            defence: Defence,
            inject: Inject,
            transport: Transport::new(seed.wrapping_add(1)),
            harassment: Harassment,
        }
    }

    fn get(&mut self, role: Role) -> &mut dyn RoleBehavior {
        match role {
            Role::Creep => &mut self.creep,
            Role::Defense => &mut self.defence,
            Role::Inject => &mut self.inject,
            Role::Transport => &mut self.transport,
            Role::Harassment => &mut self.harassment,
        }
    }
}

fn harassment_ready(observation: &Observation) -> bool {
    observation.structures_of(UnitKind::NydusNetwork).next().is_some() && observation.structures_of(UnitKind::NydusCanal).next().is_some()
}

fn transport_ready(policy: &TransportPolicy, observation: &Observation) -> bool {
    !policy.target_expansions.is_empty()
        && observation
            .structures
            .iter()
            .any(|s| s.is_ready() && policy.tech_requirement.contains(&s.kind))
}

/// Owns every queen's role and drives the role behaviors once per game loop.
pub struct Queens {
    map: MapInfo,
    policy: PolicyStore,
    assignments: BTreeMap<Tag, Assignment>,
    threats: ThreatAssessor,
    coverage: CoverageMap,
    behaviors: Behaviors,
}

impl Queens {
    pub fn new(map: MapInfo, policy: QueenPolicy) -> Queens {
        let policy = policy.resolve(&map);
        let behaviors = Behaviors::new(policy.rng_seed);

        Queens {
            map,
            policy: PolicyStore::new(policy),
            assignments: BTreeMap::new(),
            threats: ThreatAssessor::default(),
            coverage: CoverageMap::default(),
            behaviors,
        }
    }

    pub fn from_json(map: MapInfo, json: &str) -> Result<Queens, String> {
        let policy = QueenPolicy::from_json(json)?;

        Ok(Queens::new(map, policy))
    }

    pub fn policy(&self) -> Arc<QueenPolicy> {
        self.policy.snapshot()
    }

    /// Swap in a whole new policy. With `reset_roles` every queen is assigned from scratch next tick.
    pub fn set_policy(&mut self, policy: QueenPolicy, reset_roles: bool) {
        info!("Queen policy replaced (reset roles: {})", reset_roles);

        self.policy.replace(policy.resolve(&self.map));

        if reset_roles {
            self.assignments.clear();
        }
    }

    pub fn set_attack_target(&mut self, target: Point2) {
        self.policy.modify(|p| {
            p.defence.attack_target = Some(target);
            p.harassment.attack_target = Some(target);
        });
    }

    pub fn set_territory_target(&mut self, target: Point2) {
        self.policy.modify(|p| p.creep.creep_targets = vec![CreepTarget::Point(target)]);
    }

    pub fn set_rally_point(&mut self, point: Point2) {
        self.policy.modify(|p| {
            p.creep.rally_point = Some(point);
            p.defence.rally_point = Some(point);
        });
    }

    pub fn set_nydus_target(&mut self, target: Point2) {
        self.policy.modify(|p| p.harassment.nydus_target = Some(target));
    }

    pub fn assignment(&self, tag: Tag) -> Option<&Assignment> {
        self.assignments.get(&tag)
    }

    pub fn role_of(&self, tag: Tag) -> Option<Role> {
        self.assignments.get(&tag).map(|a| a.role())
    }

    pub fn count(&self, role: Role) -> usize {
        self.assignments.values().filter(|a| a.role() == role).count()
    }

    pub fn inject_target(&self, tag: Tag) -> Option<Tag> {
        self.assignments.get(&tag).and_then(|a| a.townhall())
    }

    pub fn assignments(&self) -> impl Iterator<Item = (Tag, Assignment)> + '_ {
        self.assignments.iter().map(|(tag, assignment)| (*tag, *assignment))
    }

    pub fn coverage(&self) -> &CoverageMap {
        &self.coverage
    }

    pub fn creep(&self) -> &CreepSpread {
        &self.behaviors.creep
    }

    pub fn transport(&self) -> &Transport {
        &self.behaviors.transport
    }

    /// A unit or structure died. Injectors bound to a lost townhall are freed for reassignment.
    pub fn remove_unit(&mut self, tag: Tag) {
        if let Some(assignment) = self.assignments.remove(&tag) {
            debug!("Queen {} removed from {:?}", tag, assignment.role());
        }

        self.assignments.retain(|queen, assignment| {
            let bound = assignment.townhall() == Some(tag);

            if bound {
                debug!("Townhall {} lost, releasing injector {}", tag, queen);
            }

            !bound
        });

        self.behaviors.transport.forget(tag);
        self.behaviors.creep.planner_mut().forget(tag);
    }

    /// Run every managed queen for one game loop. Orders go out through `commands`.
    pub fn tick(&mut self, iteration: u32, observation: &Observation, input: TickInput, commands: &mut dyn CommandSink) {
        let policy = self.policy.snapshot();

        let units: Vec<&Unit> = match input.units {
            Some(units) => units.iter().filter(|u| u.kind == UnitKind::Queen).sorted_by_key(|u| u.tag).collect(),
            None => observation.queens().sorted_by_key(|u| u.tag).collect(),
        };

        let spatial = SpatialIndex::build(observation);

        let threats = match input.threats {
            Some(threats) if policy.defence.pass_own_threats => self.threats.supply(observation.game_loop, threats).clone(),
            _ => self.threats.assess(observation, &spatial).clone(),
        };

        self.coverage.tick(iteration, &self.map, observation);

        self.update_assignments(&units, observation, &policy);

        let priority_threats: HashMap<Role, Option<Vec<Unit>>> = ROLES
            .iter()
            .map(|role| (*role, priority_subset(&threats, policy.role(*role).priority_defence_list())))
            .collect();

        let mut context = RoleContext {
            map: &self.map,
            observation,
            spatial: &spatial,
            coverage: &self.coverage,
            threats: &threats,
            priority_threats: None,
            policy: &policy,
            terrain: input.terrain,
            commands,
        };

        if self.coverage.should_spread_existing(iteration) {
            self.behaviors.creep.planner_mut().spread_existing_tumors(&mut context);
        }

        let mut transfused: HashSet<Tag> = HashSet::new();

        for unit in units.iter().copied() {
            let assignment = match self.assignments.get(&unit.tag) {
                Some(assignment) => *assignment,
                None => continue,
            };

            if unit.is_using(Ability::Transfusion) {
                continue;
            }

            if let Some(target) = transfuse_target(unit, &transfused, &context) {
                transfused.insert(target.tag);

                context
                    .commands
                    .issue(unit.tag, Command::ability(Ability::Transfusion, Target::Unit(target.tag)));
                continue;
            }

            let role = assignment.role();

            context.priority_threats = priority_threats.get(&role).and_then(|threats| threats.as_deref());

            if let Some(command) = self.behaviors.get(role).handle(unit, &assignment, &mut context) {
                context.commands.issue(unit.tag, command);
            }
        }

        context.priority_threats = None;

        if self.assignments.values().any(|a| a.role() == Role::Transport) {
            let passenger = units.iter().copied().find(|u| self.role_of(u.tag) == Some(Role::Transport));

            self.behaviors
                .transport
                .manage_carrier(passenger, &input.reserved_carriers, &mut context);
        }

        if policy.harassment.control_canal {
            for canal in observation
                .structures_of(UnitKind::NydusCanal)
                .filter(|c| c.is_ready() && (c.cargo_used > 0 || !c.passengers.is_empty()))
            {
                context
                    .commands
                    .issue(canal.tag, Command::ability(Ability::UnloadAllNydus, Target::None));
            }
        }

        self.behaviors.creep.planner_mut().clear_pending(observation);
    }

    fn under_capacity(&self, role: Role, policy: &QueenPolicy) -> bool {
        let role_policy = policy.role(role);

        role_policy.active() && self.count(role) < role_policy.max_queens() as usize
    }

    fn prioritized(&self, role: Role, policy: &QueenPolicy) -> bool {
        let count = self.count(role);

        self.under_capacity(role, policy)
            && policy
                .role(role)
                .priority_capacity()
                .map(|capacity| count < capacity as usize)
                .unwrap_or(false)
    }

    fn can_steal(&self, role: Role, from: Role, policy: &QueenPolicy) -> bool {
        let steal_from = match role {
            Role::Transport => &policy.transport.steal_from,
            Role::Harassment => &policy.harassment.steal_from,
            _ => return false,
        };

        steal_from.contains(&from) && self.under_capacity(role, policy)
    }

    fn reassign(&mut self, tag: Tag, assignment: Assignment) {
        if let Some(previous) = self.assignments.remove(&tag) {
            debug!("Queen {} taken from {:?} for {:?}", tag, previous.role(), assignment.role());
        }

        self.assignments.insert(tag, assignment);
    }

    fn release(&mut self, tag: Tag) {
        if let Some(previous) = self.assignments.remove(&tag) {
            debug!("Queen {} released from {:?}", tag, previous.role());
        }
    }

    /// Steals and releases for assigned queens, then a role for every queen without one.
    fn update_assignments(&mut self, units: &[&Unit], observation: &Observation, policy: &QueenPolicy) {
        let harassment_ready = harassment_ready(observation);
        let transport_ready = transport_ready(&policy.transport, observation);

        for unit in units {
            let assignment = match self.assignments.get(&unit.tag) {
                Some(assignment) => *assignment,
                None => continue,
            };

            if let Some(townhall) = assignment.townhall() {
                if observation.townhalls().all(|t| t.tag != townhall) {
                    self.release(unit.tag);
                    continue;
                }
            }

            match assignment.role() {
                Role::Harassment => {
                    let objective = policy.harassment.nydus_target(&self.map);

                    if !harassment_ready && unit.distance_to(objective) > RELEASE_DISTANCE {
                        self.release(unit.tag);
                    }
                }
                Role::Transport => {
                    let far = self
                        .behaviors
                        .transport
                        .current_target()
                        .map(|objective| unit.distance_to(objective) > RELEASE_DISTANCE)
                        .unwrap_or(true);

                    if !transport_ready && far {
                        self.release(unit.tag);
                    }
                }
                role => {
                    if harassment_ready && self.can_steal(Role::Harassment, role, policy) {
                        self.reassign(unit.tag, Assignment::Harassment);
                    } else if transport_ready && self.can_steal(Role::Transport, role, policy) {
                        self.reassign(unit.tag, Assignment::Transport);
                    }
                }
            }
        }

        for unit in units {
            if self.assignments.contains_key(&unit.tag) {
                continue;
            }

            let assignment = self.choose_assignment(unit, observation, policy);

            debug!("Queen {} assigned to {:?}", unit.tag, assignment.role());

            self.assignments.insert(unit.tag, assignment);
        }
    }

    fn choose_assignment(&self, unit: &Unit, observation: &Observation, policy: &QueenPolicy) -> Assignment {
        let free_townhall = observation
            .ready_townhalls()
            .filter(|t| !self.assignments.values().any(|a| a.townhall() == Some(t.tag)))
            .find_nearest_linear(unit.position)
            .map(|t| Assignment::Inject { townhall: t.tag });

        if let Some(inject) = free_townhall.filter(|_| self.prioritized(Role::Inject, policy)) {
            return inject;
        }

        if self.prioritized(Role::Creep, policy) {
            return Assignment::Creep;
        }

        if self.prioritized(Role::Defense, policy) {
            return Assignment::Defense;
        }

        if let Some(inject) = free_townhall.filter(|_| self.under_capacity(Role::Inject, policy)) {
            return inject;
        }

        if self.under_capacity(Role::Creep, policy) {
            return Assignment::Creep;
        }

        Assignment::Defense
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> MapInfo {
        MapInfo::open(64, 64, Point2::new(8.5, 8.5), Point2::new(56.5, 56.5))
    }

    fn observation(queens: usize, townhalls: &[Point2]) -> Observation {
        let mut observation = Observation::new(0, &map());
        observation.units = (0..queens)
            .map(|i| Unit::queen(i as Tag + 1, Point2::new(10.0 + i as f32, 10.0)))
            .collect();
        observation.structures = townhalls
            .iter()
            .enumerate()
            .map(|(i, p)| Unit::new(100 + i as Tag, UnitKind::Hatchery, *p))
            .collect();
        observation
    }

    fn tick(queens: &mut Queens, observation: &Observation) -> Vec<(Tag, Command)> {
        let mut commands = Vec::new();
        queens.tick(observation.game_loop, observation, TickInput::default(), &mut commands);
        commands
    }

    #[test]
    fn priority_quota_is_filled_first() {
        let mut queens = Queens::new(map(), QueenPolicy::default());
        let observation = observation(1, &[Point2::new(10.0, 10.0)]);

        tick(&mut queens, &observation);

        assert_eq!(queens.role_of(1), Some(Role::Creep));
    }

    #[test]
    fn inject_priority_binds_nearest_free_townhall() {
        let mut policy = QueenPolicy::default();
        policy.inject.priority = Priority::Flag(true);
        let mut queens = Queens::new(map(), policy);
        let observation = observation(2, &[Point2::new(40.0, 10.0), Point2::new(12.0, 12.0)]);

        tick(&mut queens, &observation);

        assert_eq!(queens.inject_target(1), Some(101));
        assert_eq!(queens.inject_target(2), Some(100));
    }

    #[test]
    fn inactive_roles_are_skipped() {
        let mut policy = QueenPolicy::default();
        policy.creep.active = false;
        policy.inject.active = false;
        let mut queens = Queens::new(map(), policy);

        tick(&mut queens, &observation(2, &[Point2::new(10.0, 10.0)]));

        assert_eq!(queens.count(Role::Defense), 2);
    }

    #[test]
    fn targets_are_updated_without_touching_roles() {
        let mut queens = Queens::new(map(), QueenPolicy::default());
        tick(&mut queens, &observation(1, &[]));

        queens.set_attack_target(Point2::new(30.0, 30.0));
        queens.set_territory_target(Point2::new(20.0, 40.0));
        queens.set_nydus_target(Point2::new(50.0, 20.0));

        let policy = queens.policy();
        assert_eq!(policy.defence.attack_target, Some(Point2::new(30.0, 30.0)));
        assert_eq!(policy.harassment.attack_target, Some(Point2::new(30.0, 30.0)));
        assert_eq!(policy.creep.creep_targets, vec![CreepTarget::Point(Point2::new(20.0, 40.0))]);
        assert_eq!(policy.harassment.nydus_target, Some(Point2::new(50.0, 20.0)));
        assert_eq!(queens.role_of(1), Some(Role::Creep));
    }

    #[test]
    fn canal_is_unloaded_when_controlled() {
        let mut queens = Queens::new(map(), QueenPolicy::default());
        let mut observation = observation(0, &[]);
        let mut canal = Unit::new(60, UnitKind::NydusCanal, Point2::new(50.0, 50.0));
        canal.cargo_used = 2;
        observation.structures.push(canal);

        let commands = tick(&mut queens, &observation);

        assert_eq!(commands, vec![(60, Command::ability(Ability::UnloadAllNydus, Target::None))]);
    }
}
