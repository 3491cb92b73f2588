use std::collections::HashMap;
use kl8_db::models::Draw;
use super::{ProbabilityEstimator, UNIFORM_PRIOR};

/// Persistance d'un numéro entre deux tirages consécutifs :
/// parmi les tirages où il apparaît, part de ceux où il apparaissait aussi
/// dans le tirage immédiatement plus récent.
pub struct TransitionEstimator {
    depth: usize,
    fallback: f64,
}

impl TransitionEstimator {
    pub fn new(depth: usize) -> Self {
        Self { depth, fallback: UNIFORM_PRIOR }
    }
}

impl Default for TransitionEstimator {
    fn default() -> Self {
        Self::new(500)
    }
}

impl ProbabilityEstimator for TransitionEstimator {
    fn name(&self) -> &str {
        "Markov"
    }

    fn estimate(&self, draws: &[Draw], number: u8) -> f64 {
        let depth = draws.len().min(self.depth);
        let mut transitions = 0u32;
        let mut matches = 0u32;

        // draws[i - 1] est le tirage chronologiquement suivant draws[i]
        for i in 1..depth {
            if draws[i].contains(number) {
                transitions += 1;
                if draws[i - 1].contains(number) {
                    matches += 1;
                }
            }
        }

        if transitions > 0 {
            matches as f64 / transitions as f64
        } else {
            self.fallback
        }
    }

    fn params(&self) -> HashMap<String, f64> {
        HashMap::from([
            ("depth".to_string(), self.depth as f64),
            ("fallback".to_string(), self.fallback),
        ])
    }
}
