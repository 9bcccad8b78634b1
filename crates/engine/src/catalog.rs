use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How amounts change as parts are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogMode {
    /// Counts go down as parts are used; growth stops once all reach zero.
    Limited,
    /// Counts go down, then all weights are rescaled to the previous total.
    Adaptive,
    /// Weights never change; the catalog only biases sampling.
    Unlimited,
}

/// Budget of available part types for catalog-driven stochastic growth.
///
/// `parts_total` always equals the sum of the per-name amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartCatalog {
    names: Vec<String>,
    amounts: BTreeMap<String, f64>,
    mode: CatalogMode,
    parts_total: f64,
}

impl PartCatalog {
    /// Build a catalog from `(name, amount)` pairs; negative amounts become zero.
    pub fn new(entries: impl IntoIterator<Item = (String, f64)>, mode: CatalogMode) -> Self {
        let mut names = Vec::new();
        let mut amounts = BTreeMap::new();
        for (name, amount) in entries {
            if !amounts.contains_key(&name) {
                names.push(name.clone());
            }
            amounts.insert(name, amount.max(0.0));
        }
        let parts_total = amounts.values().sum();
        Self {
            names,
            amounts,
            mode,
            parts_total,
        }
    }

    /// Update mode.
    pub fn mode(&self) -> CatalogMode {
        self.mode
    }

    /// True for a counting-down budget.
    pub fn is_limited(&self) -> bool {
        self.mode == CatalogMode::Limited
    }

    /// True when amounts are rescaled after each draw.
    pub fn is_adaptive(&self) -> bool {
        self.mode == CatalogMode::Adaptive
    }

    /// Part names in insertion order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Remaining amount for `name`.
    pub fn amount(&self, name: &str) -> Option<f64> {
        self.amounts.get(name).copied()
    }

    /// Sum of all remaining amounts.
    pub fn parts_total(&self) -> f64 {
        self.parts_total
    }

    /// True once nothing is left to draw.
    pub fn is_empty(&self) -> bool {
        self.parts_total <= 0.0
    }

    /// Roulette draw proportional to the remaining amounts.
    pub fn return_weighted_part(&self, rng: &mut impl Rng) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let draw = rng.gen_range(0.0..self.parts_total);
        let mut acc = 0.0;
        let mut last = None;
        for name in &self.names {
            let amount = self.amounts.get(name).copied().unwrap_or(0.0);
            if amount <= 0.0 {
                continue;
            }
            acc += amount;
            last = Some(name);
            if draw < acc {
                return Some(name.clone());
            }
        }
        // rounding can leave the draw just past the last band
        last.cloned()
    }

    /// Apply `delta` to one entry. Unknown names and unlimited catalogs are
    /// left untouched.
    pub fn update(&mut self, name: &str, delta: f64) {
        if self.mode == CatalogMode::Unlimited {
            return;
        }
        let Some(amount) = self.amounts.get_mut(name) else {
            return;
        };
        *amount = (*amount + delta).max(0.0);

        let previous_total = self.parts_total;
        let new_total: f64 = self.amounts.values().sum();
        if self.mode == CatalogMode::Adaptive && previous_total != 0.0 && new_total > 0.0 {
            let scale = previous_total / new_total;
            for value in self.amounts.values_mut() {
                *value *= scale;
            }
            self.parts_total = previous_total;
        } else {
            self.parts_total = new_total;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn entries() -> Vec<(String, f64)> {
        vec![("A".to_string(), 3.0), ("B".to_string(), 1.0)]
    }

    #[test]
    fn test_limited_update() {
        let mut c = PartCatalog::new(entries(), CatalogMode::Limited);
        assert_eq!(c.parts_total(), 4.0);
        c.update("A", -1.0);
        assert_eq!(c.amount("A"), Some(2.0));
        assert_eq!(c.parts_total(), 3.0);
        c.update("B", -1.0);
        c.update("A", -2.0);
        assert!(c.is_empty());
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(c.return_weighted_part(&mut rng), None);
    }

    #[test]
    fn test_adaptive_preserves_total() {
        let mut c = PartCatalog::new(entries(), CatalogMode::Adaptive);
        c.update("A", -1.0);
        assert!((c.parts_total() - 4.0).abs() < 1e-12);
        let sum: f64 = c.names().iter().filter_map(|n| c.amount(n)).sum();
        assert!((sum - 4.0).abs() < 1e-12);
        // A dropped from 3/4 to 2/3 of the mass
        assert!((c.amount("A").unwrap() - 8.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_unlimited_ignores_updates() {
        let mut c = PartCatalog::new(entries(), CatalogMode::Unlimited);
        c.update("A", -3.0);
        assert_eq!(c.amount("A"), Some(3.0));
    }

    #[test]
    fn test_weighted_draw_skips_empty_entries() {
        let mut c = PartCatalog::new(entries(), CatalogMode::Limited);
        c.update("A", -3.0);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            assert_eq!(c.return_weighted_part(&mut rng).as_deref(), Some("B"));
        }
    }
}
