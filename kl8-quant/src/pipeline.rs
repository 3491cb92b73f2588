use serde::{Deserialize, Serialize};

use kl8_db::cache::HistoryCache;
use kl8_db::models::{Draw, Pool};

use crate::analysis::convergence::ConvergenceConfig;
use crate::analysis::modulo::{modulo_stats, ModuloStats, DEFAULT_MODULUS};
use crate::analysis::palace::{palace_states, PalaceState};
use crate::analysis::tails::{tail_features, TailFeature};
use crate::analysis::{entropy, spatial_matrix};
use crate::config::QuantConfig;
use crate::features::{extract_features, NumberFeature};
use crate::generator::{load_or_generate, real_snapshot};
use crate::progress::{emit, ProgressSink, StepStatus};
use crate::providers::{default_providers, poll_providers, PollReport};
use crate::ranking::{rank, Confidence, ScoredNumber};

/// Valeur d'affichage, sans calcul sous-jacent.
pub const R_RATIO: f64 = 1.82;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub anchor_follow: Vec<u8>,
    pub core_anchor: Vec<u8>,
    pub covering: Vec<u8>,
    pub ranking: Vec<ScoredNumber>,
    pub confidence: Confidence,
    pub palaces: Vec<PalaceState>,
    pub modulo: ModuloStats,
    pub spatial_matrix: Vec<Vec<f64>>,
    pub tails: Vec<TailFeature>,
    pub entropy: f64,
    /// Décoratif.
    pub r_ratio: f64,
    /// Décoratif : cible de la trajectoire de convergence.
    pub pso_fitness: f64,
}

/// Recalcule l'ensemble des sorties à partir de l'historique, sans mémoïsation.
pub fn compute_all(draws: &[Draw], pool: Pool, anchors: &[u8]) -> PredictionResult {
    compute_all_with_modulus(draws, pool, anchors, DEFAULT_MODULUS)
}

pub fn compute_all_with_modulus(
    draws: &[Draw],
    pool: Pool,
    anchors: &[u8],
    modulus: u8,
) -> PredictionResult {
    let features = extract_features(draws, pool, anchors);
    let ranking = rank(&features);

    PredictionResult {
        anchor_follow: ranking.anchor_follow(),
        core_anchor: ranking.core_anchor(),
        covering: ranking.covering(),
        confidence: Confidence::from_ranking(&ranking),
        palaces: palace_states(draws, pool),
        modulo: modulo_stats(draws, pool, modulus, &ranking),
        spatial_matrix: spatial_matrix(draws, pool),
        tails: tail_features(draws),
        entropy: entropy(draws, pool),
        r_ratio: R_RATIO,
        pso_fitness: ConvergenceConfig::default().target,
        ranking: ranking.order().to_vec(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EtlOutput {
    pub history: Vec<Draw>,
    pub features: Vec<NumberFeature>,
    pub polls: Vec<PollReport>,
}

/// EXTRACT (sources + cache + génération), TRANSFORM (caractéristiques), LOAD.
/// `seed_draws` s'ajoute à l'instantané réel ; les tirages réels gagnent sur les synthétiques.
pub fn run_etl(
    config: &QuantConfig,
    pool: Pool,
    seed_draws: &[Draw],
    cache: &mut dyn HistoryCache,
    anchors: &[u8],
    progress: &mut dyn ProgressSink,
) -> EtlOutput {
    emit(progress, "EXTRACT : accès à l'historique complet", StepStatus::Running);

    let mut seeds = real_snapshot();
    seeds.extend_from_slice(seed_draws);
    let latest_issue = kl8_db::models::sort_newest_first(seeds.clone())
        .first()
        .map(|d| d.issue.clone())
        .unwrap_or_default();
    let polls = poll_providers(&default_providers(), &latest_issue, config.provider_delay(), progress);
    let reachable = polls.iter().filter(|p| p.ok).count();

    let loaded = load_or_generate(&seeds, &config.generator, pool, cache);
    let history = loaded.history;
    emit(
        progress,
        &format!(
            "EXTRACT : historique chargé, profondeur N={} ({}/{} sources)",
            history.len(),
            reachable,
            polls.len()
        ),
        StepStatus::Success,
    );

    emit(progress, "TRANSFORM : calcul des caractéristiques par numéro", StepStatus::Running);
    let features = extract_features(&history, pool, anchors);
    emit(
        progress,
        &format!("TRANSFORM : {} numéros sur {} tirages", features.len(), history.len()),
        StepStatus::Success,
    );

    emit(progress, "LOAD : mise en cache de l'historique récent", StepStatus::Running);
    match &loaded.cache_write {
        Ok(written) => emit(
            progress,
            &format!("LOAD : {} tirages en cache, système prêt", written),
            StepStatus::Success,
        ),
        Err(e) => emit(
            progress,
            &format!("LOAD : cache indisponible ({}), historique conservé", e),
            StepStatus::Error,
        ),
    }

    EtlOutput { history, features, polls }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{generate, GeneratorConfig};
    use crate::progress::RecordingSink;
    use kl8_db::cache::MemoryCache;

    fn small_config() -> QuantConfig {
        QuantConfig {
            generator: GeneratorConfig {
                years_back: 1,
                draws_per_year: 120,
                ..Default::default()
            },
            provider_delay_ms: 0,
            ..Default::default()
        }
    }

    fn history() -> Vec<Draw> {
        generate(&real_snapshot(), &small_config().generator, Pool::KL8)
    }

    #[test]
    fn test_compute_all_selections() {
        let result = compute_all(&history(), Pool::KL8, &[]);
        assert_eq!(result.anchor_follow.len(), 6);
        assert_eq!(result.core_anchor.len(), 4);
        assert_eq!(result.covering.len(), 7);
        assert_eq!(&result.covering[..6], &result.anchor_follow[..]);
        assert_eq!(&result.covering[..4], &result.core_anchor[..]);
        assert_eq!(result.ranking.len(), 80);
        assert_eq!(result.palaces.len(), 9);
        assert_eq!(result.tails.len(), 10);
        assert_eq!(result.spatial_matrix.len(), 8);
        assert!(result.entropy > 0.0 && result.entropy <= 1.0 + 1e-12);
        assert!((result.r_ratio - 1.82).abs() < 1e-12);
        assert!((result.pso_fitness - 0.8534).abs() < 1e-12);
    }

    #[test]
    fn test_compute_all_is_pure() {
        let draws = history();
        assert_eq!(compute_all(&draws, Pool::KL8, &[3]), compute_all(&draws, Pool::KL8, &[3]));
    }

    #[test]
    fn test_compute_all_empty_history() {
        let result = compute_all(&[], Pool::KL8, &[]);
        // Scores de repli identiques : ordre croissant des numéros
        assert_eq!(result.core_anchor, vec![1, 2, 3, 4]);
        assert_eq!(result.entropy, 0.0);
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[test]
    fn test_run_etl_steps() {
        let mut cache = MemoryCache::default();
        let mut sink = RecordingSink::default();
        let output = run_etl(&small_config(), Pool::KL8, &[], &mut cache, &[], &mut sink);

        assert_eq!(output.history.len(), 2 + 120);
        assert_eq!(output.history[0].issue, "2026017");
        assert_eq!(output.features.len(), 80);

        let first = &sink.steps[0];
        assert!(first.0.starts_with("EXTRACT") && first.1 == StepStatus::Running);
        let last = &sink.steps[sink.steps.len() - 1];
        assert!(last.0.starts_with("LOAD") && last.1 == StepStatus::Success);
        assert!(!cache.is_empty());
        assert_eq!(output.polls.len(), 3);
        assert!(output.polls.iter().all(|p| p.ok && p.latest_issue == "2026017"));
        assert!(sink.steps.iter().all(|(_, status)| *status != StepStatus::Error));
    }

    #[test]
    fn test_run_etl_cache_failure_reports_error() {
        // Quota de 3 tirages pour un préfixe de 122 : l'écriture échoue
        let config = small_config();
        let mut sink = RecordingSink::default();
        let failed = run_etl(&config, Pool::KL8, &[], &mut MemoryCache::with_quota(3), &[], &mut sink);

        let (message, status) = &sink.steps[sink.steps.len() - 1];
        assert!(message.starts_with("LOAD"));
        assert_eq!(*status, StepStatus::Error);

        let ok = run_etl(
            &config,
            Pool::KL8,
            &[],
            &mut MemoryCache::default(),
            &[],
            &mut crate::progress::NullSink,
        );
        assert_eq!(failed, ok);
    }

    #[test]
    fn test_progress_does_not_change_results() {
        let config = small_config();
        let a = run_etl(
            &config,
            Pool::KL8,
            &[],
            &mut MemoryCache::default(),
            &[],
            &mut crate::progress::NullSink,
        );
        let b = run_etl(
            &config,
            Pool::KL8,
            &[],
            &mut MemoryCache::default(),
            &[],
            &mut RecordingSink::default(),
        );
        assert_eq!(a, b);
    }
}
