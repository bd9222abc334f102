use super::geometry::*;
use super::unit::*;
use std::cmp::Ordering;

fn compare_distance(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

pub trait FindNearestItertools: Iterator {
    fn find_nearest_linear<V>(self, start_pos: Point2) -> Option<V>
    where
        Self: Iterator<Item = V> + Sized,
        V: HasPosition,
    {
        self.map(|pos_object| (start_pos.distance_squared(pos_object.pos()), pos_object))
            .min_by(|(a, _), (b, _)| compare_distance(*a, *b))
            .map(|(_, pos_object)| pos_object)
    }

    fn find_nearest_linear_with_distance<V>(self, start_pos: Point2) -> Option<(V, f32)>
    where
        Self: Iterator<Item = V> + Sized,
        V: HasPosition,
    {
        self.map(|pos_object| (start_pos.distance_squared(pos_object.pos()), pos_object))
            .min_by(|(a, _), (b, _)| compare_distance(*a, *b))
            .map(|(distance, pos_object)| (pos_object, distance.sqrt()))
    }

    fn within_distance<V>(self, start_pos: Point2, distance: f32) -> WithinDistance<Self>
    where
        Self: Iterator<Item = V> + Sized,
        V: HasPosition,
    {
        WithinDistance {
            iter: self,
            start_pos,
            distance_squared: distance * distance,
        }
    }
}

impl<T: ?Sized> FindNearestItertools for T where T: Iterator {}

pub struct WithinDistance<I> {
    iter: I,
    start_pos: Point2,
    distance_squared: f32,
}

impl<I> Iterator for WithinDistance<I>
where
    I: Iterator,
    I::Item: HasPosition,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let start_pos = self.start_pos;
        let distance_squared = self.distance_squared;

        self.iter.find(|pos_object| start_pos.distance_squared(pos_object.pos()) < distance_squared)
    }
}
