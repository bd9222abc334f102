use super::commands::*;
use super::geometry::*;
use bitflags::*;
use serde::*;

/// Engine-assigned unique unit id.
pub type Tag = u64;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    // Zerg
    Queen,
    Drone,
    Larva,
    Egg,
    Overlord,
    OverlordTransport,
    Overseer,
    Zergling,
    Baneling,
    Roach,
    Ravager,
    Hydralisk,
    Lurker,
    Mutalisk,
    Corruptor,
    BroodLord,
    Infestor,
    SwarmHost,
    Viper,
    Ultralisk,
    Changeling,
    ChangelingMarine,
    ChangelingMarineShield,
    ChangelingZealot,
    ChangelingZergling,
    ChangelingZerglingWings,
    Hatchery,
    Lair,
    Hive,
    SpawningPool,
    EvolutionChamber,
    SpineCrawler,
    SporeCrawler,
    CreepTumor,
    CreepTumorQueen,
    CreepTumorBurrowed,
    NydusNetwork,
    NydusCanal,
    // Terran
    Scv,
    Mule,
    Marine,
    Marauder,
    Reaper,
    Hellion,
    SiegeTank,
    Thor,
    Viking,
    Medivac,
    Banshee,
    Raven,
    Liberator,
    Battlecruiser,
    CommandCenter,
    OrbitalCommand,
    PlanetaryFortress,
    Bunker,
    MissileTurret,
    // Protoss
    Probe,
    Zealot,
    Stalker,
    Adept,
    Immortal,
    Colossus,
    Archon,
    Observer,
    Phoenix,
    VoidRay,
    Oracle,
    Tempest,
    Carrier,
    Nexus,
    PhotonCannon,
    ShieldBattery,
    // Neutral
    MineralField,
    Other(u32),
}

impl UnitKind {
    pub fn is_townhall(self) -> bool {
        matches!(
            self,
            UnitKind::Hatchery
                | UnitKind::Lair
                | UnitKind::Hive
                | UnitKind::CommandCenter
                | UnitKind::OrbitalCommand
                | UnitKind::PlanetaryFortress
                | UnitKind::Nexus
        )
    }

    pub fn is_creep_tumor(self) -> bool {
        matches!(self, UnitKind::CreepTumor | UnitKind::CreepTumorQueen | UnitKind::CreepTumorBurrowed)
    }

    pub fn is_changeling(self) -> bool {
        matches!(
            self,
            UnitKind::Changeling
                | UnitKind::ChangelingMarine
                | UnitKind::ChangelingMarineShield
                | UnitKind::ChangelingZealot
                | UnitKind::ChangelingZergling
                | UnitKind::ChangelingZerglingWings
        )
    }

    pub fn is_worker(self) -> bool {
        matches!(self, UnitKind::Drone | UnitKind::Scv | UnitKind::Probe | UnitKind::Mule)
    }

    /// Flying scouts that never count as air threats.
    pub fn is_scout(self) -> bool {
        matches!(self, UnitKind::Overlord | UnitKind::Overseer | UnitKind::Observer)
    }

    pub fn is_static_defence(self) -> bool {
        matches!(
            self,
            UnitKind::Bunker
                | UnitKind::PhotonCannon
                | UnitKind::PlanetaryFortress
                | UnitKind::ShieldBattery
                | UnitKind::SpineCrawler
        )
    }

    /// Units never worth shooting at.
    pub fn is_ignored_target(self) -> bool {
        matches!(self, UnitKind::Mule | UnitKind::Egg | UnitKind::Larva)
    }

    /// Ground units that anti-air weapons can hit.
    pub fn is_hit_by_anti_air(self) -> bool {
        matches!(self, UnitKind::Colossus)
    }

    /// Units that do not stop a tumor being placed near them.
    pub fn is_harmless_near_tumor(self) -> bool {
        self.is_worker() || self.is_changeling() || self.is_scout()
    }

    pub fn is_transfusable(self) -> bool {
        matches!(
            self,
            UnitKind::BroodLord
                | UnitKind::Corruptor
                | UnitKind::Hydralisk
                | UnitKind::Lurker
                | UnitKind::Mutalisk
                | UnitKind::Queen
                | UnitKind::Ravager
                | UnitKind::Roach
                | UnitKind::Overseer
                | UnitKind::Overlord
                | UnitKind::OverlordTransport
                | UnitKind::SwarmHost
                | UnitKind::Ultralisk
                | UnitKind::SpineCrawler
                | UnitKind::SporeCrawler
                | UnitKind::EvolutionChamber
                | UnitKind::Hatchery
                | UnitKind::Lair
                | UnitKind::Hive
                | UnitKind::Viper
                | UnitKind::Infestor
                | UnitKind::SpawningPool
                | UnitKind::NydusCanal
                | UnitKind::NydusNetwork
        )
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct UnitFlags: u32 {
        const FLYING = 1u32;
        const BURROWED = 1u32 << 1;
        const CLOAKED = 1u32 << 2;
        const REVEALED = 1u32 << 3;
        const HALLUCINATION = 1u32 << 4;
        const READY = 1u32 << 5;
        const IDLE = 1u32 << 6;
        const LOCKED_ON = 1u32 << 7;
        const GENERATING_CREEP = 1u32 << 8;
        const CAN_ATTACK_GROUND = 1u32 << 9;
        const CAN_ATTACK_AIR = 1u32 << 10;
    }
}

/// Order a unit is currently executing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UnitOrder {
    pub ability: Ability,
    pub target: Target,
}

/// Read-only snapshot of a unit for the current tick.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    pub tag: Tag,
    pub kind: UnitKind,
    pub position: Point2,
    pub radius: f32,
    pub health: f32,
    pub health_max: f32,
    pub shield: f32,
    pub energy: f32,
    pub flags: UnitFlags,
    /// Remaining weapon cooldown in game loops.
    pub weapon_cooldown: f32,
    pub ground_range: f32,
    pub air_range: f32,
    pub movement_speed: f32,
    /// Facing in radians.
    pub facing: f32,
    pub order: Option<UnitOrder>,
    pub cargo_used: u32,
    pub passengers: Vec<Tag>,
}

impl Unit {
    /// A ready, idle, full health unit with no weapons.
    pub fn new(tag: Tag, kind: UnitKind, position: Point2) -> Unit {
        Unit {
            tag,
            kind,
            position,
            radius: 0.5,
            health: 100.0,
            health_max: 100.0,
            shield: 0.0,
            energy: 0.0,
            flags: UnitFlags::READY | UnitFlags::IDLE,
            weapon_cooldown: 0.0,
            ground_range: 0.0,
            air_range: 0.0,
            movement_speed: 0.0,
            facing: 0.0,
            order: None,
            cargo_used: 0,
            passengers: Vec::new(),
        }
    }

    /// Queen with stock stats.
    pub fn queen(tag: Tag, position: Point2) -> Unit {
        Unit {
            radius: 0.875,
            health: 175.0,
            health_max: 175.0,
            ground_range: 5.0,
            air_range: 7.0,
            movement_speed: 1.31,
            flags: UnitFlags::READY | UnitFlags::IDLE | UnitFlags::CAN_ATTACK_GROUND | UnitFlags::CAN_ATTACK_AIR,
            ..Unit::new(tag, UnitKind::Queen, position)
        }
    }

    pub fn with_energy(mut self, energy: f32) -> Unit {
        self.energy = energy;
        self
    }

    pub fn with_health(mut self, health: f32) -> Unit {
        self.health = health;
        self
    }

    pub fn with_flags(mut self, flags: UnitFlags) -> Unit {
        self.flags |= flags;
        self
    }

    pub fn without_flags(mut self, flags: UnitFlags) -> Unit {
        self.flags.remove(flags);
        self
    }

    pub fn with_order(mut self, ability: Ability, target: Target) -> Unit {
        self.order = Some(UnitOrder { ability, target });
        self.flags.remove(UnitFlags::IDLE);
        self
    }

    pub fn with_weapons(mut self, ground_range: f32, air_range: f32) -> Unit {
        self.ground_range = ground_range;
        self.air_range = air_range;
        if ground_range > 0.0 {
            self.flags |= UnitFlags::CAN_ATTACK_GROUND;
        }
        if air_range > 0.0 {
            self.flags |= UnitFlags::CAN_ATTACK_AIR;
        }
        self
    }

    pub fn is_flying(&self) -> bool {
        self.flags.contains(UnitFlags::FLYING)
    }

    pub fn is_ready(&self) -> bool {
        self.flags.contains(UnitFlags::READY)
    }

    pub fn is_idle(&self) -> bool {
        self.flags.contains(UnitFlags::IDLE)
    }

    pub fn is_burrowed(&self) -> bool {
        self.flags.contains(UnitFlags::BURROWED)
    }

    pub fn is_hallucination(&self) -> bool {
        self.flags.contains(UnitFlags::HALLUCINATION)
    }

    /// Cloaked or burrowed and not revealed by detection.
    pub fn is_undetected(&self) -> bool {
        self.flags.intersects(UnitFlags::CLOAKED | UnitFlags::BURROWED) && !self.flags.contains(UnitFlags::REVEALED)
    }

    pub fn can_attack_ground(&self) -> bool {
        self.flags.contains(UnitFlags::CAN_ATTACK_GROUND)
    }

    pub fn can_attack_air(&self) -> bool {
        self.flags.contains(UnitFlags::CAN_ATTACK_AIR)
    }

    pub fn health_percentage(&self) -> f32 {
        if self.health_max <= 0.0 {
            0.0
        } else {
            self.health / self.health_max
        }
    }

    pub fn distance_to(&self, point: Point2) -> f32 {
        self.position.distance_to(point)
    }

    /// Whether the current order is the given ability.
    pub fn is_using(&self, ability: Ability) -> bool {
        self.order.map(|o| o.ability == ability).unwrap_or(false)
    }
}

/// Anything with a map position.
pub trait HasPosition {
    fn pos(&self) -> Point2;
}

impl HasPosition for Unit {
    fn pos(&self) -> Point2 {
        self.position
    }
}

impl HasPosition for &Unit {
    fn pos(&self) -> Point2 {
        self.position
    }
}

impl HasPosition for Point2 {
    fn pos(&self) -> Point2 {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revealed_cloak_is_detected() {
        let cloaked = Unit::new(1, UnitKind::Banshee, Point2::default()).with_flags(UnitFlags::CLOAKED);
        let revealed = cloaked.clone().with_flags(UnitFlags::REVEALED);

        assert!(cloaked.is_undetected());
        assert!(!revealed.is_undetected());
    }

    #[test]
    fn orders_clear_idle() {
        let queen = Unit::queen(1, Point2::default()).with_order(Ability::Transfusion, Target::Unit(2));

        assert!(!queen.is_idle());
        assert!(queen.is_using(Ability::Transfusion));
        assert!(!queen.is_using(Ability::InjectLarva));
    }
}
