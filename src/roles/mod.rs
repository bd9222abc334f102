pub mod creep;
pub mod defence;
pub mod harassment;
pub mod inject;
pub mod micro;
pub mod transport;
pub mod tumors;

use crate::commands::*;
use crate::coverage::*;
use crate::pathing::*;
use crate::policy::*;
use crate::spatial::*;
use crate::threat::*;
use crate::unit::*;
use crate::world::*;
use serde::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Creep,
    #[serde(alias = "Defence")]
    Defense,
    Inject,
    Transport,
    Harassment,
}

/// A unit's role plus whatever the role needs to remember about it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Assignment {
    Creep,
    Defense,
    Inject { townhall: Tag },
    Transport,
    Harassment,
}

impl Assignment {
    pub fn role(&self) -> Role {
        match self {
            Assignment::Creep => Role::Creep,
            Assignment::Defense => Role::Defense,
            Assignment::Inject { .. } => Role::Inject,
            Assignment::Transport => Role::Transport,
            Assignment::Harassment => Role::Harassment,
        }
    }

    pub fn townhall(&self) -> Option<Tag> {
        match self {
            Assignment::Inject { townhall } => Some(*townhall),
            _ => None,
        }
    }
}

/// Everything a behavior can read during a tick.
pub struct RoleContext<'a> {
    pub map: &'a MapInfo,
    pub observation: &'a Observation,
    pub spatial: &'a SpatialIndex,
    pub coverage: &'a CoverageMap,
    pub threats: &'a ThreatSet,
    /// Threats on the current role's priority list.
    pub priority_threats: Option<&'a [Unit]>,
    pub policy: &'a QueenPolicy,
    pub terrain: Option<&'a dyn TerrainOracle>,
    /// Orders for units other than the one being handled, such as tumors or carriers.
    pub commands: &'a mut dyn CommandSink,
}

impl<'a> RoleContext<'a> {
    pub fn priority_threats(&self) -> Option<&'a [Unit]> {
        self.priority_threats.filter(|threats| !threats.is_empty())
    }
}

pub trait RoleBehavior {
    /// The single order for `unit` this tick, if any.
    fn handle(&mut self, unit: &Unit, assignment: &Assignment, context: &mut RoleContext) -> Option<Command>;
}
