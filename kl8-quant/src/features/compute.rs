use kl8_db::models::{Draw, Pool};

use super::{HotLevel, NumberFeature, Trend, LONG_WINDOW, SHORT_WINDOW};
use crate::models::{hit_rate, PosteriorEstimator, ProbabilityEstimator, TransitionEstimator};

/// draws[0] = le plus récent. Aucun dénominateur nul : un historique vide donne
/// des écarts à 0, des moyennes à 0, FROID et tendance plate.
pub fn extract_features(draws: &[Draw], pool: Pool, anchors: &[u8]) -> Vec<NumberFeature> {
    let markov = TransitionEstimator::default();
    let bayes = PosteriorEstimator::default();

    // Tirages où tous les numéros d'ancrage sont présents ; aucun sans ancrage
    let anchor_draws: Vec<&Draw> = if anchors.is_empty() {
        Vec::new()
    } else {
        draws
            .iter()
            .filter(|d| anchors.iter().all(|&a| d.contains(a)))
            .collect()
    };

    pool.numbers()
        .map(|number| {
            let appearances = appearances(number, draws);
            let (current_gap, max_gap) = gaps(&appearances, draws.len());

            let ma30 = hit_rate(draws, number, SHORT_WINDOW);
            let ma100 = hit_rate(draws, number, LONG_WINDOW);

            NumberFeature {
                number,
                freq: appearances.len() as u32,
                current_gap,
                max_gap,
                ma30,
                hot_level: HotLevel::from_ma30(ma30),
                trend: Trend::from_averages(ma30, ma100),
                cond_prob: conditional_probability(number, &anchor_draws),
                markov_prob: markov.estimate(draws, number),
                bayesian_post: bayes.estimate(draws, number),
            }
        })
        .collect()
}

/// Indices (0 = plus récent) des tirages contenant `number`.
pub fn appearances(number: u8, draws: &[Draw]) -> Vec<usize> {
    draws
        .iter()
        .enumerate()
        .filter(|(_, d)| d.contains(number))
        .map(|(i, _)| i)
        .collect()
}

/// (écart courant, écart maximal). L'écart maximal compare l'écart avant la première
/// apparition, les écarts entre apparitions et l'écart après la dernière.
pub fn gaps(appearances: &[usize], total: usize) -> (u32, u32) {
    let (first, last) = match (appearances.first(), appearances.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return (total as u32, total as u32),
    };

    let current_gap = first;
    let mut max_gap = current_gap;
    for w in appearances.windows(2) {
        max_gap = max_gap.max(w[1] - w[0] - 1);
    }
    let tail_gap = total - 1 - last;
    max_gap = max_gap.max(tail_gap);

    (current_gap as u32, max_gap as u32)
}

/// P(number | tous les ancrages). Vaut 0 sans ancrage ou si les ancrages
/// ne sont jamais sortis ensemble.
fn conditional_probability(number: u8, anchor_draws: &[&Draw]) -> f64 {
    if anchor_draws.is_empty() {
        return 0.0;
    }
    let joint = anchor_draws.iter().filter(|d| d.contains(number)).count();
    joint as f64 / anchor_draws.len() as f64
}
