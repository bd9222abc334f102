#![recursion_limit = "128"]
#![warn(clippy::all)]

pub mod allocator;
pub mod cache;
pub mod commands;
pub mod constants;
pub mod coverage;
pub mod findnearest;
pub mod geometry;
pub mod grid;
pub mod logging;
pub mod machine_tick;
pub mod pathing;
pub mod policy;
pub mod roles;
pub mod spatial;
pub mod threat;
pub mod unit;
pub mod world;

pub use allocator::{Queens, TickInput};
pub use commands::{Ability, Command, CommandSink, Target};
pub use geometry::Point2;
pub use policy::QueenPolicy;
pub use roles::{Assignment, Role};
pub use unit::{Tag, Unit, UnitFlags, UnitKind};
pub use world::{MapInfo, Observation};
