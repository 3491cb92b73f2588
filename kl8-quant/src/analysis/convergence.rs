//! Trajectoire de « convergence » purement décorative, pour l'animation d'un graphique.
//! Elle n'a aucune valeur analytique et ne doit pas être présentée comme une métrique.

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    pub steps: usize,
    pub base: f64,
    pub target: f64,
    /// Fraction de la distance restante parcourue à chaque pas.
    pub rate: f64,
    /// Bruit uniforme ajouté à chaque pas, dans [0, jitter).
    pub jitter: f64,
    pub ceiling: f64,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            steps: 40,
            base: 0.35,
            target: 0.8534,
            rate: 0.15,
            jitter: 0.05,
            ceiling: 0.92,
        }
    }
}

pub fn simulate_convergence<R: Rng + ?Sized>(config: &ConvergenceConfig, rng: &mut R) -> Vec<f64> {
    let mut fitness = config.base;
    let mut trajectory = Vec::with_capacity(config.steps);

    for _ in 0..config.steps {
        let noise = if config.jitter > 0.0 {
            rng.random_range(0.0..config.jitter)
        } else {
            0.0
        };
        fitness += (config.target - fitness) * config.rate + noise;
        trajectory.push(fitness.min(config.ceiling));
    }

    trajectory
}
