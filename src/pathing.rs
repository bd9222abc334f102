use super::geometry::*;
use super::grid::*;
use pathfinding::prelude::astar;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GridLayer {
    Ground,
    Air,
    /// Ground costs with enemy effects and danger zones weighted in.
    Avoidance,
}

/// Optional pathfinding and safety queries. Behaviors fall back to straight-line movement without one.
pub trait TerrainOracle {
    /// Waypoints from `from` to `to`, excluding the start, one every `sensitivity` cells.
    fn pathfind(&self, from: Point2, to: Point2, layer: GridLayer, sensitivity: usize) -> Option<Vec<Point2>>;

    fn is_position_safe(&self, position: Point2, layer: GridLayer) -> bool;

    /// Cheapest reachable cell within `radius` of `from`, nearest first on ties.
    fn closest_safe_spot(&self, from: Point2, radius: f32, layer: GridLayer) -> Option<Point2>;
}

/// Cost grids supplied by the caller for the current tick.
#[derive(Clone, Debug)]
pub struct TerrainGrids {
    pub ground: CostGrid,
    pub air: Option<CostGrid>,
    pub avoidance: Option<CostGrid>,
}

const COST_SCALE: f32 = 10.0;
const SAFE_WEIGHT: f32 = 1.0;

impl TerrainGrids {
    pub fn new(ground: CostGrid) -> TerrainGrids {
        TerrainGrids {
            ground,
            air: None,
            avoidance: None,
        }
    }

    fn layer(&self, layer: GridLayer) -> &CostGrid {
        match layer {
            GridLayer::Ground => &self.ground,
            GridLayer::Air => self.air.as_ref().unwrap_or(&self.ground),
            GridLayer::Avoidance => self.avoidance.as_ref().unwrap_or(&self.ground),
        }
    }

    fn weight(grid: &CostGrid, x: i32, y: i32) -> Option<f32> {
        grid.get(x, y).copied().filter(|w| w.is_finite())
    }
}

impl TerrainOracle for TerrainGrids {
    fn pathfind(&self, from: Point2, to: Point2, layer: GridLayer, sensitivity: usize) -> Option<Vec<Point2>> {
        let grid = self.layer(layer);
        let start = from.cell();
        let goal = to.cell();

        Self::weight(grid, goal.0, goal.1)?;

        let successors = |&(x, y): &(i32, i32)| -> Vec<((i32, i32), u32)> {
            let mut next = Vec::with_capacity(8);

            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }

                    if let Some(weight) = Self::weight(grid, x + dx, y + dy) {
                        let step = if dx != 0 && dy != 0 { std::f32::consts::SQRT_2 } else { 1.0 };

                        next.push(((x + dx, y + dy), (weight * step * COST_SCALE).round() as u32));
                    }
                }
            }

            next
        };

        // Octile distance; admissible because every finite weight is at least 1.
        let heuristic = |&(x, y): &(i32, i32)| -> u32 {
            let dx = (x - goal.0).abs() as f32;
            let dy = (y - goal.1).abs() as f32;
            let octile = dx.max(dy) + (std::f32::consts::SQRT_2 - 1.0) * dx.min(dy);

            (octile * COST_SCALE) as u32
        };

        let (cells, _) = astar(&start, successors, heuristic, |&cell| cell == goal)?;

        let mut waypoints: Vec<Point2> = cells
            .iter()
            .skip(1)
            .step_by(sensitivity.max(1))
            .map(|&(x, y)| cell_to_point(x as usize, y as usize))
            .collect();

        let goal_point = cell_to_point(goal.0 as usize, goal.1 as usize);

        if cells.len() > 1 && waypoints.last() != Some(&goal_point) {
            waypoints.push(goal_point);
        }

        Some(waypoints)
    }

    fn is_position_safe(&self, position: Point2, layer: GridLayer) -> bool {
        match self.layer(layer).at(position) {
            Some(weight) => weight.is_infinite() || *weight <= SAFE_WEIGHT,
            None => true,
        }
    }

    fn closest_safe_spot(&self, from: Point2, radius: f32, layer: GridLayer) -> Option<Point2> {
        let grid = self.layer(layer);
        let (cx, cy) = from.cell();
        let reach = radius.ceil() as i32;
        let mut best: Option<(f32, f32, Point2)> = None;

        for y in (cy - reach)..=(cy + reach) {
            for x in (cx - reach)..=(cx + reach) {
                let weight = match Self::weight(grid, x, y) {
                    Some(weight) => weight,
                    None => continue,
                };

                let point = cell_to_point(x as usize, y as usize);
                let distance = point.distance_to(from);

                if distance > radius {
                    continue;
                }

                let better = match best {
                    Some((best_weight, best_distance, _)) => weight < best_weight || (weight == best_weight && distance < best_distance),
                    None => true,
                };

                if better {
                    best = Some((weight, distance, point));
                }
            }
        }

        best.map(|(_, _, point)| point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walled() -> TerrainGrids {
        // Vertical wall at x = 5 with a gap at y = 9.
        let ground = Grid::from_fn(10, 10, |x, y| if x == 5 && y != 9 { f32::INFINITY } else { 1.0 });

        TerrainGrids::new(ground)
    }

    #[test]
    fn path_goes_around_walls() {
        let grids = walled();

        let path = grids
            .pathfind(Point2::new(1.5, 1.5), Point2::new(8.5, 1.5), GridLayer::Ground, 1)
            .unwrap();

        assert!(path.iter().any(|p| p.cell() == (5, 9)));
        assert_eq!(path.last(), Some(&Point2::new(8.5, 1.5)));
    }

    #[test]
    fn unreachable_goal_has_no_path() {
        let grids = walled();

        assert!(grids.pathfind(Point2::new(1.5, 1.5), Point2::new(5.5, 1.5), GridLayer::Ground, 1).is_none());
    }

    #[test]
    fn safety_uses_avoidance_layer() {
        let mut grids = walled();
        let mut avoidance = grids.ground.clone();
        avoidance.set(2, 2, 8.0);
        grids.avoidance = Some(avoidance);

        assert!(!grids.is_position_safe(Point2::new(2.5, 2.5), GridLayer::Avoidance));
        assert!(grids.is_position_safe(Point2::new(2.5, 2.5), GridLayer::Ground));
        assert!(grids.is_position_safe(Point2::new(5.5, 2.5), GridLayer::Avoidance));

        let spot = grids.closest_safe_spot(Point2::new(2.5, 2.5), 3.0, GridLayer::Avoidance).unwrap();
        assert!(grids.is_position_safe(spot, GridLayer::Avoidance));
        assert!(spot.distance_to(Point2::new(2.5, 2.5)) <= 1.0);
    }
}
