//! Transformations descriptives de l'historique, indépendantes du classement.

pub mod convergence;
pub mod modulo;
pub mod palace;
pub mod tails;

use kl8_db::models::{Draw, Pool};

pub const ENTROPY_WINDOW: usize = 500;
pub const SPATIAL_WINDOW: usize = 100;
pub const SPATIAL_COLUMNS: usize = 10;

/// Comptage des apparitions par numéro sur les `window` tirages récents.
/// counts[n - 1] = nombre d'apparitions de n.
pub fn occurrence_counts(draws: &[Draw], pool: Pool, window: usize) -> Vec<u32> {
    let mut counts = vec![0u32; pool.size as usize];
    for draw in draws.iter().take(window) {
        for &n in &draw.numbers {
            let idx = (n as usize).wrapping_sub(1);
            if idx < counts.len() {
                counts[idx] += 1;
            }
        }
    }
    counts
}

// ════════════════════════════════════════════════════════════════
// Entropie de Shannon
// ════════════════════════════════════════════════════════════════

/// Entropie de la distribution des apparitions, normalisée par log2(taille du pool).
/// Proche de 1 pour une distribution quasi uniforme, 0 sur un historique vide.
pub fn entropy(draws: &[Draw], pool: Pool) -> f64 {
    let counts = occurrence_counts(draws, pool, ENTROPY_WINDOW);
    let total: u32 = counts.iter().sum();
    if total == 0 || pool.size < 2 {
        return 0.0;
    }

    let h: f64 = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum();

    h / (pool.size as f64).log2()
}

// ════════════════════════════════════════════════════════════════
// Matrice spatiale
// ════════════════════════════════════════════════════════════════

/// Grille de 10 colonnes : la cellule (ligne, colonne) porte le numéro
/// `ligne * 10 + colonne + 1` et vaut son nombre d'apparitions récentes.
pub fn spatial_matrix(draws: &[Draw], pool: Pool) -> Vec<Vec<f64>> {
    let counts = occurrence_counts(draws, pool, SPATIAL_WINDOW);
    counts
        .chunks(SPATIAL_COLUMNS)
        .map(|row| row.iter().map(|&c| c as f64).collect())
        .collect()
}
