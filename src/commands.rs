use super::geometry::*;
use super::unit::*;
use serde::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    InjectLarva,
    Transfusion,
    BuildCreepTumorQueen,
    BuildCreepTumorTumor,
    MorphOverlordTransport,
    GenerateCreepOn,
    LoadOverlord,
    UnloadAllAt,
    UnloadAllNydus,
    Smart,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Target {
    None,
    Unit(Tag),
    Point(Point2),
}

/// A single intent issued to a unit for this tick.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Move(Point2),
    /// Attack a unit, or attack-move when targeting a point.
    Attack(Target),
    UseAbility { ability: Ability, target: Target },
}

impl Command {
    pub fn ability(ability: Ability, target: Target) -> Command {
        Command::UseAbility { ability, target }
    }

    pub fn attack_unit(tag: Tag) -> Command {
        Command::Attack(Target::Unit(tag))
    }

    pub fn attack_move(point: Point2) -> Command {
        Command::Attack(Target::Point(point))
    }
}

/// The engine's command primitives.
pub trait CommandSink {
    fn issue(&mut self, tag: Tag, command: Command);
}

impl CommandSink for Vec<(Tag, Command)> {
    fn issue(&mut self, tag: Tag, command: Command) {
        self.push((tag, command));
    }
}
