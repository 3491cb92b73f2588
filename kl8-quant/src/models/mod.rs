pub mod bayesian;
pub mod markov;

use std::collections::HashMap;
use kl8_db::models::Draw;

pub use bayesian::PosteriorEstimator;
pub use markov::TransitionEstimator;

/// Probabilité a priori uniforme d'un numéro : 20 tirés sur 80.
pub const UNIFORM_PRIOR: f64 = 0.25;

pub trait ProbabilityEstimator: Send + Sync {
    fn name(&self) -> &str;
    /// draws[0] = tirage le plus récent. Ne lève jamais d'erreur : chaque cas dégénéré
    /// a une valeur de repli.
    fn estimate(&self, draws: &[Draw], number: u8) -> f64;
    fn params(&self) -> HashMap<String, f64>;
}

/// Taux d'apparition de `number` sur les `window` tirages les plus récents
/// (ou moins si l'historique est plus court). 0.0 sur un historique vide.
pub fn hit_rate(draws: &[Draw], number: u8, window: usize) -> f64 {
    let w = window.min(draws.len());
    if w == 0 {
        return 0.0;
    }
    let hits = draws[..w].iter().filter(|d| d.contains(number)).count();
    hits as f64 / w as f64
}

/// Apparitions de `number` sur les `window` tirages récents, rapportées à `window`
/// quelle que soit la longueur de l'historique.
pub fn window_rate(draws: &[Draw], number: u8, window: usize) -> f64 {
    if window == 0 {
        return 0.0;
    }
    let hits = draws.iter().take(window).filter(|d| d.contains(number)).count();
    hits as f64 / window as f64
}

#[cfg(test)]
pub fn make_draws(rows: &[&[u8]]) -> Vec<Draw> {
    rows.iter()
        .enumerate()
        .map(|(i, nums)| Draw::new(format!("{:07}", 2_000_000 - i), "TEST", nums.to_vec()))
        .collect()
}
