/// Value computed at most once per game loop.
#[derive(Clone, Debug)]
pub struct TickCache<T> {
    entry: Option<(u32, T)>,
}

impl<T> Default for TickCache<T> {
    fn default() -> TickCache<T> {
        TickCache { entry: None }
    }
}

impl<T> TickCache<T> {
    pub fn get_or_insert_with<F>(&mut self, game_loop: u32, f: F) -> &T
    where
        F: FnOnce() -> T,
    {
        if !matches!(self.entry, Some((stamp, _)) if stamp == game_loop) {
            self.entry = None;
        }

        &self.entry.get_or_insert_with(|| (game_loop, f())).1
    }

    pub fn get(&self, game_loop: u32) -> Option<&T> {
        self.entry.as_ref().filter(|(stamp, _)| *stamp == game_loop).map(|(_, value)| value)
    }

    pub fn insert(&mut self, game_loop: u32, value: T) {
        self.entry = Some((game_loop, value));
    }

    pub fn expire(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recomputes_on_new_loop_only() {
        let mut cache = TickCache::default();
        let mut fills = 0;

        cache.get_or_insert_with(3, || {
            fills += 1;
            10
        });
        let value = *cache.get_or_insert_with(3, || {
            fills += 1;
            20
        });

        assert_eq!(value, 10);
        assert_eq!(fills, 1);

        assert_eq!(*cache.get_or_insert_with(4, || 30), 30);
        assert_eq!(cache.get(3), None);
        assert_eq!(cache.get(4), Some(&30));

        cache.expire();
        assert_eq!(cache.get(4), None);
    }
}
