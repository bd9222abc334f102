use serde::*;
use std::ops::*;

/// A position on the map, in game units.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Point2 {
        Point2 { x, y }
    }

    pub fn distance_squared(&self, other: Point2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;

        dx * dx + dy * dy
    }

    pub fn distance_to(&self, other: Point2) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Point `distance` along the line from self to `target`. Negative distances step away.
    pub fn towards(&self, target: Point2, distance: f32) -> Point2 {
        let length = self.distance_to(target);

        if length <= f32::EPSILON {
            return *self;
        }

        *self + (target - *self) * (distance / length)
    }

    /// Point at `distance` along the bearing `angle` (radians).
    pub fn polar_offset(&self, angle: f32, distance: f32) -> Point2 {
        Point2::new(self.x + angle.cos() * distance, self.y + angle.sin() * distance)
    }

    pub fn angle_to(&self, target: Point2) -> f32 {
        (target.y - self.y).atan2(target.x - self.x)
    }

    /// The 8 surrounding points at unit offsets.
    pub fn neighbors8(&self) -> [Point2; 8] {
        let Point2 { x, y } = *self;

        [
            Point2::new(x - 1.0, y - 1.0),
            Point2::new(x, y - 1.0),
            Point2::new(x + 1.0, y - 1.0),
            Point2::new(x - 1.0, y),
            Point2::new(x + 1.0, y),
            Point2::new(x - 1.0, y + 1.0),
            Point2::new(x, y + 1.0),
            Point2::new(x + 1.0, y + 1.0),
        ]
    }

    /// Grid cell containing this point.
    pub fn cell(&self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Snap to the center of the containing cell, which is where structures are placed.
    pub fn cell_center(&self) -> Point2 {
        Point2::new(self.x.floor() + 0.5, self.y.floor() + 0.5)
    }

    pub fn center<I>(points: I) -> Option<Point2>
    where
        I: IntoIterator<Item = Point2>,
    {
        let (sum, count) = points
            .into_iter()
            .fold((Point2::default(), 0usize), |(sum, count), point| (sum + point, count + 1));

        if count == 0 {
            None
        } else {
            Some(sum * (1.0 / count as f32))
        }
    }
}

impl Add for Point2 {
    type Output = Point2;

    fn add(self, other: Point2) -> Point2 {
        Point2::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point2 {
    type Output = Point2;

    fn sub(self, other: Point2) -> Point2 {
        Point2::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Point2 {
    type Output = Point2;

    fn mul(self, scale: f32) -> Point2 {
        Point2::new(self.x * scale, self.y * scale)
    }
}

impl From<(f32, f32)> for Point2 {
    fn from((x, y): (f32, f32)) -> Point2 {
        Point2::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn towards_moves_fixed_distance() {
        let from = Point2::new(0.0, 0.0);
        let to = Point2::new(10.0, 0.0);

        assert_eq!(from.towards(to, 3.0), Point2::new(3.0, 0.0));
        assert_eq!(from.towards(to, -2.0), Point2::new(-2.0, 0.0));
        assert_eq!(from.towards(from, 5.0), from);
    }

    #[test]
    fn cell_center_snaps_to_half() {
        assert_eq!(Point2::new(10.2, 4.9).cell_center(), Point2::new(10.5, 4.5));
        assert_eq!(Point2::new(10.5, 4.5).cell_center(), Point2::new(10.5, 4.5));
    }

    #[test]
    fn center_of_nothing_is_none() {
        assert_eq!(Point2::center(Vec::new()), None);
        assert_eq!(
            Point2::center(vec![Point2::new(0.0, 0.0), Point2::new(4.0, 2.0)]),
            Some(Point2::new(2.0, 1.0))
        );
    }
}
