use std::sync::Arc;

use rand::Rng;

use crate::catalog::{Scenario, ScenarioCatalog};

/// Weighted-random choice over a [`ScenarioCatalog`].
///
/// The selector itself holds no random state: each worker passes its own generator, which
/// keeps draws contention-free and reproducible for a seeded worker.
#[derive(Debug, Clone)]
pub struct ScenarioSelector {
    catalog: Arc<ScenarioCatalog>,
}

impl ScenarioSelector {
    pub fn new(catalog: Arc<ScenarioCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ScenarioCatalog {
        &self.catalog
    }

    pub fn select<R: Rng>(&self, rng: &mut R) -> &Scenario {
        let draw = rng.random_range(0.0..self.catalog.total_weight());
        self.pick(draw)
    }

    /// Returns the first scenario whose cumulative weight strictly exceeds `draw`.
    ///
    /// Falls back to the first scenario if floating-point drift leaves the walk empty-handed.
    fn pick(&self, draw: f64) -> &Scenario {
        let all = self.catalog.all();

        let mut cumulative = 0.0;
        for s in all {
            cumulative += s.weight;
            if cumulative > draw {
                return s;
            }
        }

        &all[0]
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::UrlTemplate;
    use rand::SeedableRng as _;
    use rand::rngs::StdRng;

    fn catalog(weights: &[f64]) -> Arc<ScenarioCatalog> {
        let scenarios = weights
            .iter()
            .enumerate()
            .map(|(i, w)| Scenario::get(&format!("s{i}"), UrlTemplate::fixed(format!("/{i}")), *w))
            .collect();
        Arc::new(ScenarioCatalog::new(scenarios).unwrap())
    }

    #[test]
    fn weight_one_vs_three_converges_to_three_quarters() {
        let selector = ScenarioSelector::new(catalog(&[1.0, 3.0]));
        let mut rng = StdRng::seed_from_u64(0x5eed);

        let draws = 10_000;
        let b = (0..draws)
            .filter(|_| &*selector.select(&mut rng).name == "s1")
            .count();
        let freq = b as f64 / draws as f64;

        assert!((freq - 0.75).abs() <= 0.02, "frequency of B was {freq}");
    }

    #[test]
    fn frequencies_track_relative_weights() {
        let weights = [20.0, 5.0, 20.0, 15.0, 10.0, 8.0, 7.0, 6.0, 4.0, 3.0, 2.0];
        let cat = catalog(&weights);
        let selector = ScenarioSelector::new(cat.clone());
        let mut rng = StdRng::seed_from_u64(7);

        let draws = 100_000;
        let mut counts = vec![0u64; weights.len()];
        for _ in 0..draws {
            let name = selector.select(&mut rng).name.clone();
            let idx: usize = name.trim_start_matches('s').parse().unwrap();
            counts[idx] += 1;
        }

        for ((_, expected), got) in cat.shares().zip(counts) {
            let observed = got as f64 / draws as f64;
            assert!(
                (observed - expected).abs() < 0.01,
                "expected {expected}, observed {observed}"
            );
        }
    }

    #[test]
    fn walk_uses_strict_cumulative_bounds() {
        let selector = ScenarioSelector::new(catalog(&[1.0, 3.0]));
        assert_eq!(&*selector.pick(0.0).name, "s0");
        assert_eq!(&*selector.pick(0.999).name, "s0");
        assert_eq!(&*selector.pick(1.0).name, "s1");
        assert_eq!(&*selector.pick(3.999).name, "s1");
    }

    #[test]
    fn draw_past_total_falls_back_to_first() {
        let selector = ScenarioSelector::new(catalog(&[1.0, 3.0]));
        assert_eq!(&*selector.pick(4.0).name, "s0");
        assert_eq!(&*selector.pick(f64::MAX).name, "s0");
    }

    #[test]
    fn single_scenario_is_always_selected() {
        let selector = ScenarioSelector::new(catalog(&[0.5]));
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(&*selector.select(&mut rng).name, "s0");
        }
    }
}
