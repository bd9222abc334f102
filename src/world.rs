use super::geometry::*;
use super::grid::*;
use super::unit::*;

/// Static map data, known once the game starts.
#[derive(Clone, Debug)]
pub struct MapInfo {
    pub placement: Grid<bool>,
    pub pathing: Grid<bool>,
    pub heights: Grid<f32>,
    pub expansions: Vec<Point2>,
    pub start_location: Point2,
    pub enemy_start_location: Point2,
}

impl MapInfo {
    /// Flat map where everything is pathable and buildable.
    pub fn open(width: usize, height: usize, start_location: Point2, enemy_start_location: Point2) -> MapInfo {
        MapInfo {
            placement: Grid::new(width, height, true),
            pathing: Grid::new(width, height, true),
            heights: Grid::new(width, height, 0.0),
            expansions: Vec::new(),
            start_location,
            enemy_start_location,
        }
    }

    pub fn center(&self) -> Point2 {
        Point2::new(self.pathing.width() as f32 / 2.0, self.pathing.height() as f32 / 2.0)
    }

    pub fn in_map_bounds(&self, point: Point2) -> bool {
        self.pathing.contains(point)
    }

    pub fn in_placement_grid(&self, point: Point2) -> bool {
        self.placement.is_set(point)
    }

    pub fn in_pathing_grid(&self, point: Point2) -> bool {
        self.pathing.is_set(point)
    }

    pub fn terrain_height(&self, point: Point2) -> f32 {
        self.heights.at(point).copied().unwrap_or(0.0)
    }

    /// Expansions far enough from home to be worth spreading creep towards, nearest first.
    pub fn expansions_beyond(&self, gap: f32) -> Vec<Point2> {
        let start = self.start_location;
        let mut expansions: Vec<Point2> = self
            .expansions
            .iter()
            .copied()
            .filter(|e| e.distance_to(start) > gap)
            .collect();

        expansions.sort_by(|a, b| {
            a.distance_squared(start)
                .partial_cmp(&b.distance_squared(start))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        expansions
    }
}

/// Everything the engine reports for one game loop.
#[derive(Clone, Debug)]
pub struct Observation {
    pub game_loop: u32,
    /// Elapsed game time in seconds.
    pub time: f32,
    /// Game loops advanced per engine step.
    pub game_step: u32,
    pub units: Vec<Unit>,
    pub structures: Vec<Unit>,
    pub enemy_units: Vec<Unit>,
    pub enemy_structures: Vec<Unit>,
    pub mineral_fields: Vec<Unit>,
    pub creep: Grid<bool>,
    pub visibility: Grid<bool>,
    pub minerals: u32,
    pub vespene: u32,
}

impl Observation {
    /// Empty observation with no creep and full vision.
    pub fn new(game_loop: u32, map: &MapInfo) -> Observation {
        let width = map.pathing.width();
        let height = map.pathing.height();

        Observation {
            game_loop,
            time: game_loop as f32 / super::constants::GAME_LOOPS_PER_SECOND,
            game_step: 8,
            units: Vec::new(),
            structures: Vec::new(),
            enemy_units: Vec::new(),
            enemy_structures: Vec::new(),
            mineral_fields: Vec::new(),
            creep: Grid::new(width, height, false),
            visibility: Grid::new(width, height, true),
            minerals: 0,
            vespene: 0,
        }
    }

    pub fn has_creep(&self, point: Point2) -> bool {
        self.creep.is_set(point)
    }

    pub fn is_visible(&self, point: Point2) -> bool {
        self.visibility.is_set(point)
    }

    pub fn townhalls(&self) -> impl Iterator<Item = &Unit> {
        self.structures.iter().filter(|s| s.kind.is_townhall())
    }

    pub fn ready_townhalls(&self) -> impl Iterator<Item = &Unit> {
        self.townhalls().filter(|s| s.is_ready())
    }

    pub fn structures_of(&self, kind: UnitKind) -> impl Iterator<Item = &Unit> {
        self.structures.iter().filter(move |s| s.kind == kind)
    }

    pub fn queens(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|u| u.kind == UnitKind::Queen)
    }

    pub fn creep_tumors(&self) -> impl Iterator<Item = &Unit> {
        self.structures.iter().filter(|s| s.kind.is_creep_tumor())
    }

    pub fn enemy_townhalls(&self) -> impl Iterator<Item = &Unit> {
        self.enemy_structures.iter().filter(|s| s.kind.is_townhall())
    }

    pub fn all_enemies(&self) -> impl Iterator<Item = &Unit> {
        self.enemy_units.iter().chain(self.enemy_structures.iter())
    }

    pub fn own_unit(&self, tag: Tag) -> Option<&Unit> {
        self.units.iter().chain(self.structures.iter()).find(|u| u.tag == tag)
    }
}
