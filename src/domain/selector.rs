//! Uniform random choice of an image name.

use rand::seq::IndexedRandom;

use super::ImagePool;
use crate::error::GatewayError;

/// Picks images uniformly at random.
///
/// Uses `rand`'s thread-local generator, which is seeded from the OS once
/// per thread. Each worker thread therefore owns its own generator and
/// concurrent picks never contend.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelector;

impl RandomSelector {
    /// Creates a selector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns a name chosen uniformly from `pool.names()`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if the pool is empty.
    pub fn pick<'a>(&self, pool: &'a ImagePool) -> Result<&'a str, GatewayError> {
        pool.names()
            .choose(&mut rand::rng())
            .map(String::as_str)
            .ok_or_else(|| GatewayError::Configuration("image pool is empty".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn pool(names: &[&str]) -> ImagePool {
        let Ok(pool) = ImagePool::from_memory(names.iter().map(|n| (*n, vec![0u8]))) else {
            panic!("valid pool");
        };
        pool
    }

    #[test]
    fn pick_returns_member() {
        let pool = pool(&["a.jpg", "b.jpg", "c/d.jpg"]);
        let selector = RandomSelector::new();
        for _ in 0..100 {
            let Ok(name) = selector.pick(&pool) else {
                panic!("pick failed");
            };
            assert!(pool.contains(name));
        }
    }

    #[test]
    fn single_member_pool_always_picks_it() {
        let pool = pool(&["only.jpg"]);
        assert_eq!(RandomSelector::new().pick(&pool).ok(), Some("only.jpg"));
    }

    #[test]
    fn every_name_is_eventually_picked() {
        let names = ["1.jpg", "2.jpg", "3.jpg", "4.jpg", "5.jpg"];
        let pool = pool(&names);
        let selector = RandomSelector::new();

        let mut hits: HashMap<&str, usize> = HashMap::new();
        for _ in 0..1000 {
            let Ok(name) = selector.pick(&pool) else {
                panic!("pick failed");
            };
            *hits.entry(name).or_default() += 1;
        }

        assert_eq!(hits.len(), names.len());
        // expected 200 each; 100 is many standard deviations away
        assert!(hits.values().all(|&count| count > 100));
    }
}
