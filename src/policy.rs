use super::constants::*;
use super::geometry::*;
use super::roles::Role;
use super::unit::*;
use super::world::*;
use log::*;
use serde::*;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Whether a role takes units ahead of the others, and how many.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Priority {
    Flag(bool),
    Quota(u32),
}

impl Priority {
    /// Number of units the role may claim ahead of the others, if it is prioritized at all.
    pub fn capacity(&self, max_queens: u32) -> Option<u32> {
        match *self {
            Priority::Flag(true) => Some(max_queens),
            Priority::Flag(false) | Priority::Quota(0) => None,
            Priority::Quota(quota) => Some(quota),
        }
    }
}

/// Caller supplied predicate evaluated against the current observation.
#[derive(Clone, Default)]
pub enum Condition {
    #[default]
    Never,
    Always,
    When(Arc<dyn Fn(&Observation) -> bool + Send + Sync>),
}

impl Condition {
    pub fn when<F>(f: F) -> Condition
    where
        F: Fn(&Observation) -> bool + Send + Sync + 'static,
    {
        Condition::When(Arc::new(f))
    }

    pub fn evaluate(&self, observation: &Observation) -> bool {
        match self {
            Condition::Never => false,
            Condition::Always => true,
            Condition::When(f) => f(observation),
        }
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Never => write!(f, "Never"),
            Condition::Always => write!(f, "Always"),
            Condition::When(_) => write!(f, "When(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D>(deserializer: D) -> Result<Condition, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = bool::deserialize(deserializer)?;

        Ok(if value { Condition::Always } else { Condition::Never })
    }
}

/// Where creep should be spread towards.
#[derive(Clone, Debug, PartialEq)]
pub enum CreepTarget {
    /// Spread from the start location towards this point.
    Point(Point2),
    /// Spread along the path between two points.
    Path(Point2, Point2),
    Unrecognized(String),
}

fn parse_point(value: &Value) -> Option<Point2> {
    match value {
        Value::Object(fields) => Some(Point2::new(
            fields.get("x")?.as_f64()? as f32,
            fields.get("y")?.as_f64()? as f32,
        )),
        Value::Array(items) if items.len() == 2 => Some(Point2::new(items[0].as_f64()? as f32, items[1].as_f64()? as f32)),
        _ => None,
    }
}

impl CreepTarget {
    pub fn from_value(value: &Value) -> CreepTarget {
        if let Some(point) = parse_point(value) {
            return CreepTarget::Point(point);
        }

        if let Value::Array(items) = value {
            if let [start, end] = items.as_slice() {
                if let (Some(start), Some(end)) = (parse_point(start), parse_point(end)) {
                    return CreepTarget::Path(start, end);
                }
            }
        }

        warn!("Unrecognized creep target: {}", value);

        CreepTarget::Unrecognized(value.to_string())
    }

    /// Start and end of the spread path.
    pub fn endpoints(&self, map: &MapInfo) -> (Point2, Point2) {
        match self {
            CreepTarget::Point(point) => (map.start_location, *point),
            CreepTarget::Path(start, end) => (*start, *end),
            CreepTarget::Unrecognized(_) => (map.start_location, map.enemy_start_location),
        }
    }

    /// Single point the target is centred on.
    pub fn position(&self, map: &MapInfo) -> Point2 {
        self.endpoints(map).1
    }
}

fn lenient_creep_targets<'de, D>(deserializer: D) -> Result<Vec<CreepTarget>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;

    Ok(values.iter().map(CreepTarget::from_value).collect())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadStyle {
    Targeted,
    Random,
}

/// Settings every role shares.
pub trait RolePolicy {
    fn active(&self) -> bool;

    fn max_queens(&self) -> u32;

    fn priority(&self) -> Priority;

    fn defend_against_air(&self) -> bool;

    fn defend_against_ground(&self) -> bool;

    fn pass_own_threats(&self) -> bool;

    fn priority_defence_list(&self) -> &HashSet<UnitKind>;

    fn priority_capacity(&self) -> Option<u32> {
        self.priority().capacity(self.max_queens())
    }
}

macro_rules! impl_role_policy {
    ($policy:ty) => {
        impl RolePolicy for $policy {
            fn active(&self) -> bool {
                self.active
            }

            fn max_queens(&self) -> u32 {
                self.max
            }

            fn priority(&self) -> Priority {
                self.priority
            }

            fn defend_against_air(&self) -> bool {
                self.defend_against_air
            }

            fn defend_against_ground(&self) -> bool {
                self.defend_against_ground
            }

            fn pass_own_threats(&self) -> bool {
                self.pass_own_threats
            }

            fn priority_defence_list(&self) -> &HashSet<UnitKind> {
                &self.priority_defence_list
            }
        }
    };
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CreepPolicy {
    pub active: bool,
    pub max: u32,
    pub priority: Priority,
    pub defend_against_air: bool,
    pub defend_against_ground: bool,
    pub pass_own_threats: bool,
    pub priority_defence_list: HashSet<UnitKind>,
    pub distance_between_existing_tumors: f32,
    pub distance_between_queen_tumors: f32,
    pub min_distance_between_existing_tumors: f32,
    pub should_tumors_block_expansions: bool,
    #[serde(deserialize_with = "lenient_creep_targets")]
    pub creep_targets: Vec<CreepTarget>,
    pub spread_style: SpreadStyle,
    pub rally_point: Option<Point2>,
    pub target_perc_coverage: f32,
    pub first_tumor_position: Option<Point2>,
    pub prioritize_creep: Condition,
}

impl Default for CreepPolicy {
    fn default() -> CreepPolicy {
        CreepPolicy {
            active: true,
            max: 2,
            priority: Priority::Quota(1),
            defend_against_air: true,
            defend_against_ground: false,
            pass_own_threats: false,
            priority_defence_list: HashSet::new(),
            distance_between_existing_tumors: 10.0,
            distance_between_queen_tumors: 7.0,
            min_distance_between_existing_tumors: 3.0,
            should_tumors_block_expansions: false,
            creep_targets: Vec::new(),
            spread_style: SpreadStyle::Targeted,
            rally_point: None,
            target_perc_coverage: 75.0,
            first_tumor_position: None,
            prioritize_creep: Condition::Never,
        }
    }
}

impl CreepPolicy {
    pub fn rally_point(&self, map: &MapInfo) -> Point2 {
        self.rally_point.unwrap_or(map.start_location)
    }
}

impl_role_policy!(CreepPolicy);

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DefencePolicy {
    pub active: bool,
    pub max: u32,
    pub priority: Priority,
    pub defend_against_air: bool,
    pub defend_against_ground: bool,
    pub pass_own_threats: bool,
    pub priority_defence_list: HashSet<UnitKind>,
    pub attack_condition: Condition,
    pub attack_target: Option<Point2>,
    pub rally_point: Option<Point2>,
}

impl Default for DefencePolicy {
    fn default() -> DefencePolicy {
        DefencePolicy {
            active: true,
            max: 6,
            priority: Priority::Flag(false),
            defend_against_air: true,
            defend_against_ground: true,
            pass_own_threats: false,
            priority_defence_list: HashSet::new(),
            attack_condition: Condition::Never,
            attack_target: None,
            rally_point: None,
        }
    }
}

impl DefencePolicy {
    pub fn attack_target(&self, map: &MapInfo) -> Point2 {
        self.attack_target.unwrap_or(map.enemy_start_location)
    }

    pub fn rally_point(&self, map: &MapInfo) -> Point2 {
        self.rally_point.unwrap_or(map.start_location)
    }
}

impl_role_policy!(DefencePolicy);

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct InjectPolicy {
    pub active: bool,
    pub max: u32,
    pub priority: Priority,
    pub defend_against_air: bool,
    pub defend_against_ground: bool,
    pub pass_own_threats: bool,
    pub priority_defence_list: HashSet<UnitKind>,
}

impl Default for InjectPolicy {
    fn default() -> InjectPolicy {
        InjectPolicy {
            active: true,
            max: 6,
            priority: Priority::Flag(false),
            defend_against_air: false,
            defend_against_ground: false,
            pass_own_threats: false,
            priority_defence_list: HashSet::new(),
        }
    }
}

impl_role_policy!(InjectPolicy);

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TransportPolicy {
    pub active: bool,
    pub max: u32,
    pub priority: Priority,
    pub defend_against_air: bool,
    pub defend_against_ground: bool,
    pub pass_own_threats: bool,
    pub priority_defence_list: HashSet<UnitKind>,
    pub steal_from: HashSet<Role>,
    /// Any one of these, ready, unlocks the carrier morph.
    pub tech_requirement: Vec<UnitKind>,
    pub target_expansions: Vec<Point2>,
}

impl Default for TransportPolicy {
    fn default() -> TransportPolicy {
        TransportPolicy {
            active: true,
            max: 1,
            priority: Priority::Flag(false),
            defend_against_air: false,
            defend_against_ground: false,
            pass_own_threats: false,
            priority_defence_list: HashSet::new(),
            steal_from: [Role::Creep].into_iter().collect(),
            tech_requirement: vec![UnitKind::Lair, UnitKind::Hive],
            target_expansions: Vec::new(),
        }
    }
}

impl_role_policy!(TransportPolicy);

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HarassmentPolicy {
    pub active: bool,
    pub max: u32,
    pub priority: Priority,
    pub defend_against_air: bool,
    pub defend_against_ground: bool,
    pub pass_own_threats: bool,
    pub priority_defence_list: HashSet<UnitKind>,
    pub steal_from: HashSet<Role>,
    pub attack_target: Option<Point2>,
    pub nydus_target: Option<Point2>,
    /// Unload every canal each tick so queens pop out as soon as they arrive.
    pub control_canal: bool,
}

impl Default for HarassmentPolicy {
    fn default() -> HarassmentPolicy {
        HarassmentPolicy {
            active: true,
            max: 2,
            priority: Priority::Flag(false),
            defend_against_air: false,
            defend_against_ground: false,
            pass_own_threats: false,
            priority_defence_list: HashSet::new(),
            steal_from: [Role::Defense].into_iter().collect(),
            attack_target: None,
            nydus_target: None,
            control_canal: true,
        }
    }
}

impl HarassmentPolicy {
    pub fn attack_target(&self, map: &MapInfo) -> Point2 {
        self.attack_target.unwrap_or(map.enemy_start_location)
    }

    pub fn nydus_target(&self, map: &MapInfo) -> Point2 {
        self.nydus_target.unwrap_or(map.enemy_start_location)
    }
}

impl_role_policy!(HarassmentPolicy);

/// Complete configuration for every role.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QueenPolicy {
    #[serde(rename = "creep_queens")]
    pub creep: CreepPolicy,
    #[serde(rename = "defence_queens")]
    pub defence: DefencePolicy,
    #[serde(rename = "inject_queens")]
    pub inject: InjectPolicy,
    #[serde(rename = "transport_queens", alias = "creep_dropperlord_queens")]
    pub transport: TransportPolicy,
    #[serde(rename = "harassment_queens", alias = "nydus_queens")]
    pub harassment: HarassmentPolicy,
    pub rng_seed: u64,
}

impl Default for QueenPolicy {
    fn default() -> QueenPolicy {
        QueenPolicy {
            creep: CreepPolicy::default(),
            defence: DefencePolicy::default(),
            inject: InjectPolicy::default(),
            transport: TransportPolicy::default(),
            harassment: HarassmentPolicy::default(),
            rng_seed: 0x5175_6565_6e73,
        }
    }
}

impl QueenPolicy {
    pub fn from_json(json: &str) -> Result<QueenPolicy, String> {
        serde_json::from_str(json).map_err(|err| format!("Invalid queen policy: {}", err))
    }

    pub fn role(&self, role: Role) -> &dyn RolePolicy {
        match role {
            Role::Creep => &self.creep,
            Role::Defense => &self.defence,
            Role::Inject => &self.inject,
            Role::Transport => &self.transport,
            Role::Harassment => &self.harassment,
        }
    }

    /// Fill in defaults that depend on the map.
    pub fn resolve(mut self, map: &MapInfo) -> QueenPolicy {
        if self.creep.creep_targets.is_empty() {
            self.creep.creep_targets = map
                .expansions_beyond(EXPANSION_GAP_THRESHOLD)
                .into_iter()
                .map(CreepTarget::Point)
                .collect();
        }

        for target in self.creep.creep_targets.iter_mut() {
            if let CreepTarget::Unrecognized(raw) = target {
                warn!("Replacing creep target {} with a path to the enemy start location", raw);

                *target = CreepTarget::Path(map.start_location, map.enemy_start_location);
            }
        }

        self
    }
}

/// Holds the current policy snapshot. Updates replace the whole snapshot.
#[derive(Clone, Debug)]
pub struct PolicyStore {
    current: Arc<QueenPolicy>,
}

impl PolicyStore {
    pub fn new(policy: QueenPolicy) -> PolicyStore {
        PolicyStore { current: Arc::new(policy) }
    }

    pub fn snapshot(&self) -> Arc<QueenPolicy> {
        self.current.clone()
    }

    pub fn replace(&mut self, policy: QueenPolicy) {
        self.current = Arc::new(policy);
    }

    pub fn modify<F>(&mut self, f: F)
    where
        F: FnOnce(&mut QueenPolicy),
    {
        let mut next = (*self.current).clone();

        f(&mut next);

        self.current = Arc::new(next);
    }
}
