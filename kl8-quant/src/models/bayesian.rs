use std::collections::HashMap;
use kl8_db::models::Draw;
use super::{window_rate, ProbabilityEstimator, UNIFORM_PRIOR};

/// Plancher du taux récent : évite un numérateur nul.
pub const RECENT_FLOOR: f64 = 0.001;

/// Score « postérieur » : prior * taux récent / taux de référence.
/// Les taux sont toujours rapportés aux fenêtres configurées (50 et 500), même sur un
/// historique plus court. Ce n'est pas une probabilité normalisée, la valeur peut dépasser 1.
pub struct PosteriorEstimator {
    prior: f64,
    recent_window: usize,
    baseline_window: usize,
}

impl PosteriorEstimator {
    pub fn new(recent_window: usize, baseline_window: usize) -> Self {
        Self {
            prior: UNIFORM_PRIOR,
            recent_window,
            baseline_window,
        }
    }
}

impl Default for PosteriorEstimator {
    fn default() -> Self {
        Self::new(50, 500)
    }
}

impl ProbabilityEstimator for PosteriorEstimator {
    fn name(&self) -> &str {
        "Bayes"
    }

    fn estimate(&self, draws: &[Draw], number: u8) -> f64 {
        let mut recent = window_rate(draws, number, self.recent_window);
        if recent == 0.0 {
            recent = RECENT_FLOOR;
        }
        let mut baseline = window_rate(draws, number, self.baseline_window);
        if baseline == 0.0 {
            baseline = UNIFORM_PRIOR;
        }
        self.prior * recent / baseline
    }

    fn params(&self) -> HashMap<String, f64> {
        HashMap::from([
            ("prior".to_string(), self.prior),
            ("recent_window".to_string(), self.recent_window as f64),
            ("baseline_window".to_string(), self.baseline_window as f64),
        ])
    }
}
