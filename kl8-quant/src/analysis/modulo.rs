use serde::{Deserialize, Serialize};

use kl8_db::models::{Draw, Pool};

use crate::ranking::Ranking;

pub const DEFAULT_MODULUS: u8 = 13;
pub const MODULO_WINDOW: usize = 100;
pub const PREDICTED_PER_RESIDUE: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidueStat {
    pub remainder: u8,
    pub count: u32,
    /// Effectif attendu si les tirages étaient uniformes sur le pool.
    pub expected: f64,
    pub cycle_score: f64,
    pub predicted_numbers: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuloStats {
    pub modulus: u8,
    pub residues: Vec<ResidueStat>,
}

/// Répartition des numéros récents par classe de reste modulo `modulus`.
pub fn modulo_stats(draws: &[Draw], pool: Pool, modulus: u8, ranking: &Ranking) -> ModuloStats {
    let modulus = modulus.max(1);
    let recent = &draws[..MODULO_WINDOW.min(draws.len())];
    let entries: usize = recent.iter().map(|d| d.numbers.len()).sum();

    let residues = (0..modulus)
        .map(|remainder| {
            let class_size = pool.numbers().filter(|n| n % modulus == remainder).count();
            let count = recent
                .iter()
                .map(|d| d.numbers.iter().filter(|&&n| n % modulus == remainder).count() as u32)
                .sum::<u32>();
            let expected = if pool.size == 0 {
                0.0
            } else {
                entries as f64 * class_size as f64 / pool.size as f64
            };
            let cycle_score = if expected > 0.0 {
                count as f64 / expected
            } else {
                0.0
            };
            let predicted_numbers = ranking
                .order()
                .iter()
                .map(|s| s.number)
                .filter(|n| n % modulus == remainder)
                .take(PREDICTED_PER_RESIDUE)
                .collect();
            ResidueStat {
                remainder,
                count,
                expected,
                cycle_score,
                predicted_numbers,
            }
        })
        .collect();

    ModuloStats { modulus, residues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::extract_features;
    use crate::models::make_draws;
    use crate::ranking::rank;

    #[test]
    fn test_modulo_counts() {
        let pool = Pool::new(26, 2);
        let draws = make_draws(&[&[1, 14], &[2, 13]]);
        let ranking = rank(&extract_features(&draws, pool, &[]));
        let stats = modulo_stats(&draws, pool, 13, &ranking);
        assert_eq!(stats.residues.len(), 13);
        assert_eq!(stats.residues[1].count, 2);
        assert_eq!(stats.residues[0].count, 1);
        assert_eq!(stats.residues[2].count, 1);
        // 4 entrées, 2 numéros par classe sur 26 : attendu 4 * 2 / 26
        let expected = 4.0 * 2.0 / 26.0;
        assert!((stats.residues[1].expected - expected).abs() < 1e-12);
        assert!((stats.residues[1].cycle_score - 2.0 / expected).abs() < 1e-12);
    }

    #[test]
    fn test_predicted_numbers_follow_ranking() {
        let draws = crate::generator::generate(
            &[],
            &crate::generator::GeneratorConfig { years_back: 1, ..Default::default() },
            Pool::KL8,
        );
        let ranking = rank(&extract_features(&draws, Pool::KL8, &[]));
        let stats = modulo_stats(&draws, Pool::KL8, DEFAULT_MODULUS, &ranking);
        for residue in &stats.residues {
            assert!(residue.predicted_numbers.len() <= PREDICTED_PER_RESIDUE);
            let positions: Vec<usize> = residue
                .predicted_numbers
                .iter()
                .filter_map(|&n| ranking.position(n))
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
            assert!(residue.predicted_numbers.iter().all(|n| n % 13 == residue.remainder));
        }
        let total: u32 = stats.residues.iter().map(|r| r.count).sum();
        assert_eq!(total, 100 * 20);
    }

    #[test]
    fn test_modulo_empty_history() {
        let ranking = rank(&[]);
        let stats = modulo_stats(&[], Pool::KL8, 13, &ranking);
        assert!(stats
            .residues
            .iter()
            .all(|r| r.count == 0 && r.cycle_score == 0.0 && r.predicted_numbers.is_empty()));
    }
}
