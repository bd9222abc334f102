//! Game constants. Distances are in map units, times in seconds unless noted.

/// Game loops per second at faster speed.
pub const GAME_LOOPS_PER_SECOND: f32 = 22.4;

pub const INJECT_ENERGY_COST: f32 = 25.0;
pub const CREEP_TUMOR_ENERGY_COST: f32 = 25.0;
pub const TRANSFUSE_ENERGY_COST: f32 = 50.0;
/// Tumors are placed from inside a canal only when there is energy left over for a transfuse.
pub const HARASS_TUMOR_ENERGY: f32 = 75.0;

pub const TRANSFUSE_SEARCH_RANGE: f32 = 11.0;
pub const TRANSFUSE_HEALTH_THRESHOLD: f32 = 0.5;

pub const THREAT_RADIUS: f32 = 18.0;
pub const RALLY_RADIUS: f32 = 6.0;
pub const ATTACK_RANGE_BONUS: f32 = 0.375;
/// Largest footprint radius of any unit, used to widen radius queries before exact filtering.
pub const MAX_UNIT_RADIUS: f32 = 2.75;

/// Queen turn rate in degrees per second.
pub const QUEEN_TURN_RATE: f32 = 999.8437;
pub const SPEED_MULTIPLIER: f32 = 1.4;

pub const INJECT_LEASH: f32 = 12.5;
pub const INJECT_DEFEND_RADIUS: f32 = 13.0;
pub const MINERAL_LINE_RADIUS: f32 = 8.0;
pub const MINERAL_LINE_NUDGE_RADIUS: f32 = 6.0;
pub const MINERAL_LINE_NUDGE_INTERVAL: u32 = 32;

/// Game loops before a burrowed tumor can spread.
pub const TUMOR_COOLDOWN: u32 = (11.0 * GAME_LOOPS_PER_SECOND) as u32 + 7;
pub const TUMOR_SPREAD_RANGE: f32 = 11.0;
pub const PENDING_TUMOR_TIMEOUT: f32 = 10.0;
pub const PENDING_TUMOR_RADIUS: f32 = 3.0;
pub const TARGETED_SPREAD_WINDOW: f32 = 8.0;
pub const FIRST_TUMOR_RETRIES: u32 = 5;
pub const RANDOM_WALK_STEPS: u32 = 5;
pub const CREEP_MAP_INTERVAL: u32 = 8;
pub const COVERAGE_INTERVAL: u32 = 128;
pub const FULL_SPREAD_COVERAGE: f32 = 50.0;

pub const BLOCK_EXPANSION_RADIUS: f32 = 5.0;
pub const ENEMY_TOWNHALL_RADIUS: f32 = 20.0;
pub const NYDUS_CLEARANCE_RADIUS: f32 = 12.0;
pub const ENEMY_CLEARANCE_RADIUS: f32 = 12.0;
pub const QUEEN_TUMOR_ENEMY_RADIUS: f32 = 11.0;
pub const CREEP_RALLY_LEASH: f32 = 7.0;
pub const CAST_ABORT_PADDING: f32 = 2.0;

/// Expansions closer than this to the start location are skipped as default creep targets.
pub const EXPANSION_GAP_THRESHOLD: f32 = 15.0;
pub const PATH_SENSITIVITY: usize = 6;
pub const SAFE_SPOT_RADIUS: f32 = 7.0;

pub const RELEASE_DISTANCE: f32 = 50.0;

pub const CANAL_WAIT_DISTANCE: f32 = 30.0;
pub const NYDUS_BOARD_DISTANCE: f32 = 45.0;
pub const NYDUS_NETWORK_REACH: f32 = 70.0;
pub const HARASS_TUMOR_RADIUS: f32 = 15.0;
pub const HARASS_TUMOR_LIMIT: usize = 7;
pub const OFFENSIVE_GROUP_RADIUS: f32 = 5.0;
pub const OFFENSIVE_GROUP_SIZE: usize = 3;

pub const CARRIER_MIN_HEALTH: f32 = 0.95;
pub const CARRIER_RETREAT_HEALTH: f32 = 0.2;
pub const CARRIER_LOAD_RANGE: f32 = 3.0;
pub const CARRIER_LOAD_LOCK: f32 = 3.0;
pub const TRANSPORT_PLACEMENT_RANGE: f32 = 15.0;
pub const TRANSPORT_TARGET_OFFSET: f32 = 8.0;
pub const TRANSPORT_TARGET_SAMPLES: u32 = 50;
pub const TRANSPORT_CREEP_CLEARANCE: f32 = 12.0;
pub const TRANSPORT_MORPH_MINERALS: u32 = 25;
pub const TRANSPORT_MORPH_VESPENE: u32 = 25;
