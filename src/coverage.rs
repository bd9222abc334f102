use super::constants::*;
use super::findnearest::*;
use super::geometry::*;
use super::grid::*;
use super::world::*;

/// Snapshot of where creep is and how much of the pathable map it covers.
#[derive(Clone, Debug, Default)]
pub struct CoverageMap {
    creep_tiles: Vec<Point2>,
    no_creep_tiles: Vec<Point2>,
    percentage: Option<f32>,
}

impl CoverageMap {
    pub fn update_map(&mut self, map: &MapInfo, observation: &Observation) {
        self.creep_tiles.clear();
        self.no_creep_tiles.clear();

        for ((x, y), pathable) in map.pathing.iter() {
            let point = cell_to_point(x, y);

            if observation.has_creep(point) {
                self.creep_tiles.push(point);
            } else if *pathable {
                self.no_creep_tiles.push(point);
            }
        }
    }

    pub fn refresh_percentage(&mut self) {
        let covered = self.creep_tiles.len();
        let total = covered + self.no_creep_tiles.len();

        self.percentage = Some(if total == 0 { 0.0 } else { covered as f32 * 100.0 / total as f32 });
    }

    /// Map upkeep on the tick cadence. The first call always populates.
    pub fn tick(&mut self, iteration: u32, map: &MapInfo, observation: &Observation) {
        let first = self.percentage.is_none();

        if first || iteration % CREEP_MAP_INTERVAL == 0 {
            self.update_map(map, observation);
        }

        if first || iteration % COVERAGE_INTERVAL == 0 {
            self.refresh_percentage();
        }
    }

    pub fn percentage(&self) -> f32 {
        self.percentage.unwrap_or(0.0)
    }

    pub fn creep_tiles(&self) -> &[Point2] {
        &self.creep_tiles
    }

    pub fn closest_creep_tile(&self, point: Point2) -> Option<Point2> {
        self.creep_tiles.iter().copied().find_nearest_linear(point)
    }

    pub fn closest_no_creep_tile(&self, point: Point2) -> Option<Point2> {
        self.no_creep_tiles.iter().copied().find_nearest_linear(point)
    }

    /// Existing tumors spread every tick below half coverage, then less often as coverage grows.
    pub fn should_spread_existing(&self, iteration: u32) -> bool {
        let coverage = self.percentage();

        if coverage < FULL_SPREAD_COVERAGE {
            return true;
        }

        let interval = ((coverage / 8.0) as u32).max(1);

        iteration % interval == 0
    }
}
