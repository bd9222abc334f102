use super::geometry::*;

/// Dense row-major grid covering the map.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

/// Movement cost per cell. `f32::INFINITY` marks impassable cells, values above 1 are dangerous.
pub type CostGrid = Grid<f32>;

impl<T: Clone> Grid<T> {
    pub fn new(width: usize, height: usize, fill: T) -> Grid<T> {
        Grid {
            width,
            height,
            cells: vec![fill; width * height],
        }
    }
}

impl<T> Grid<T> {
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Grid<T>
    where
        F: FnMut(usize, usize) -> T,
    {
        let mut cells = Vec::with_capacity(width * height);

        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }

        Grid { width, height, cells }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            None
        } else {
            Some(y as usize * self.width + x as usize)
        }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn at(&self, point: Point2) -> Option<&T> {
        let (x, y) = point.cell();

        self.get(x, y)
    }

    pub fn set(&mut self, x: i32, y: i32, value: T) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = value;
        }
    }

    pub fn contains(&self, point: Point2) -> bool {
        let (x, y) = point.cell();

        self.index(x, y).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &T)> {
        let width = self.width;

        self.cells.iter().enumerate().map(move |(i, v)| ((i % width, i / width), v))
    }
}

impl Grid<bool> {
    /// Out of bounds reads as false.
    pub fn is_set(&self, point: Point2) -> bool {
        self.at(point).copied().unwrap_or(false)
    }

    pub fn fill_rect(&mut self, min: (i32, i32), max: (i32, i32), value: bool) {
        for y in min.1..max.1 {
            for x in min.0..max.0 {
                self.set(x, y, value);
            }
        }
    }
}

/// Center of a grid cell.
pub fn cell_to_point(x: usize, y: usize) -> Point2 {
    Point2::new(x as f32 + 0.5, y as f32 + 0.5)
}
