use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use kl8_db::cache::{CacheError, HistoryCache};
use kl8_db::models::{issue_key, sort_newest_first, Draw, Pool};

use crate::rng::draw_without_replacement;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Année la plus récente générée ; les années précédentes suivent.
    pub latest_year: i32,
    pub years_back: u32,
    pub draws_per_year: u32,
    /// Plafond de taille de l'historique (tirages réels inclus).
    pub max_total: usize,
    /// Empreinte de version du cache : un cache d'une autre version est ignoré.
    pub fingerprint: String,
    /// Nombre de tirages récents écrits dans le cache.
    pub cache_prefix: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            latest_year: 2025,
            years_back: 5,
            draws_per_year: 360,
            max_total: 5000,
            fingerprint: "KL8-SYNTH-V5.3".to_string(),
            cache_prefix: 1000,
        }
    }
}

/// Tirages réels connus, prioritaires sur les tirages synthétiques.
pub fn real_snapshot() -> Vec<Draw> {
    vec![
        Draw::new(
            "2026017",
            "2026-01-17",
            vec![3, 8, 12, 15, 21, 28, 30, 35, 39, 44, 48, 52, 55, 60, 63, 68, 71, 74, 78, 80],
        ),
        Draw::new(
            "2026016",
            "2026-01-16",
            vec![1, 5, 9, 14, 22, 27, 31, 36, 40, 43, 47, 51, 56, 59, 64, 67, 72, 75, 79, 80],
        ),
    ]
}

pub fn issue_label(year: i32, sequence: u32) -> String {
    format!("{}{:03}", year, sequence)
}

/// Tirage synthétique d'une période : la seed est la valeur numérique du libellé.
pub fn synthetic_draw(issue: &str, year: i32, pool: Pool) -> Draw {
    let numbers = draw_without_replacement(issue_key(issue), pool.size, pool.pick_count);
    Draw::new(issue, format!("{}-HISTORICAL", year), numbers)
}

/// Complète `seed_draws` avec des tirages synthétiques, du plus récent au plus ancien,
/// jusqu'à `max_total`. Un libellé déjà présent n'est jamais régénéré.
pub fn generate(seed_draws: &[Draw], config: &GeneratorConfig, pool: Pool) -> Vec<Draw> {
    let mut history = sort_newest_first(seed_draws.to_vec());
    let mut known: HashSet<String> = history.iter().map(|d| d.issue.clone()).collect();

    let first_year = config.latest_year - config.years_back as i32 + 1;

    'years: for year in (first_year..=config.latest_year).rev() {
        for sequence in (1..=config.draws_per_year).rev() {
            if history.len() >= config.max_total {
                break 'years;
            }
            let issue = issue_label(year, sequence);
            if known.contains(&issue) {
                continue;
            }
            history.push(synthetic_draw(&issue, year, pool));
            known.insert(issue);
        }
    }

    sort_newest_first(history)
}

/// Historique de travail et issue de l'écriture du cache.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedHistory {
    pub history: Vec<Draw>,
    /// Nombre de tirages écrits, ou l'erreur du cache. L'historique reste valable.
    pub cache_write: Result<usize, CacheError>,
}

/// Charge l'historique depuis le cache si son empreinte est à jour, complète par
/// génération puis réécrit un préfixe borné dans le cache.
/// Un échec d'écriture du cache est journalisé et n'affecte pas l'historique.
pub fn load_or_generate(
    seed_draws: &[Draw],
    config: &GeneratorConfig,
    pool: Pool,
    cache: &mut dyn HistoryCache,
) -> LoadedHistory {
    // Les tirages réels passent en premier : le dédoublonnage garde la première occurrence
    let mut existing = seed_draws.to_vec();
    match cache.get(&config.fingerprint) {
        Some(cached) => {
            tracing::info!(count = cached.len(), fingerprint = %config.fingerprint, "cache valide");
            existing.extend(cached);
        }
        None => {
            tracing::debug!(fingerprint = %config.fingerprint, "cache absent ou périmé");
        }
    }

    let history = generate(&existing, config, pool);

    let prefix = config.cache_prefix.min(history.len());
    let cache_write = cache.put(&config.fingerprint, &history[..prefix]).map(|()| prefix);
    if let Err(e) = &cache_write {
        tracing::warn!(error = %e, "écriture du cache ignorée");
    }

    LoadedHistory { history, cache_write }
}
