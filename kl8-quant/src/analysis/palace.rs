use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use kl8_db::models::{Draw, Pool};

pub const PALACE_WIDTH: u8 = 9;
pub const PALACE_DEPTH: usize = 500;

/// Plage contiguë de numéros : 1-9, 10-18, …, 73-80 pour le KL8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palace {
    pub id: u8,
    pub start: u8,
    pub end: u8,
}

impl Palace {
    pub fn contains(&self, number: u8) -> bool {
        number >= self.start && number <= self.end
    }

    pub fn numbers_in<'a>(&self, draw: &'a Draw) -> impl Iterator<Item = u8> + 'a {
        let (start, end) = (self.start, self.end);
        draw.numbers.iter().copied().filter(move |&n| n >= start && n <= end)
    }

    pub fn count_in(&self, draw: &Draw) -> u32 {
        self.numbers_in(draw).count() as u32
    }
}

pub fn palaces(pool: Pool) -> Vec<Palace> {
    let mut result = Vec::new();
    let mut start = 1u8;
    let mut id = 1u8;
    while start <= pool.size {
        let end = start.saturating_add(PALACE_WIDTH - 1).min(pool.size);
        result.push(Palace { id, start, end });
        if end == u8::MAX {
            break;
        }
        start = end + 1;
        id += 1;
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PalaceTrend {
    /// Au moins un numéro du tirage précédent se répète dans la plage.
    Repeat,
    /// Un numéro voisin (±1) d'un numéro précédent.
    Diagonal,
    Fluctuating,
    /// Aucun numéro dans la plage au dernier tirage.
    Vacuum,
}

impl std::fmt::Display for PalaceTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PalaceTrend::Repeat => write!(f, "RÉPÉTITION"),
            PalaceTrend::Diagonal => write!(f, "DIAGONALE"),
            PalaceTrend::Fluctuating => write!(f, "FLUCTUATION"),
            PalaceTrend::Vacuum => write!(f, "VIDE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PalaceState {
    pub palace: Palace,
    pub current_count: u32,
    pub previous_count: u32,
    /// Probabilité du nombre de numéros au prochain tirage, par effectif.
    pub next_state_probs: BTreeMap<u32, f64>,
    pub trend_type: PalaceTrend,
    pub predicted_next_count: u32,
    pub confidence: f64,
}

pub fn palace_states(draws: &[Draw], pool: Pool) -> Vec<PalaceState> {
    palaces(pool)
        .into_iter()
        .map(|palace| palace_state(palace, draws))
        .collect()
}

fn palace_state(palace: Palace, draws: &[Draw]) -> PalaceState {
    let depth = draws.len().min(PALACE_DEPTH);
    let counts: Vec<u32> = draws[..depth].iter().map(|d| palace.count_in(d)).collect();

    let current_count = counts.first().copied().unwrap_or(0);
    let previous_count = counts.get(1).copied().unwrap_or(0);

    // counts[i] (plus ancien) -> counts[i - 1] (plus récent)
    let mut row: BTreeMap<u32, u32> = BTreeMap::new();
    for i in 1..counts.len() {
        if counts[i] == current_count {
            *row.entry(counts[i - 1]).or_insert(0) += 1;
        }
    }

    // État jamais quitté : on retombe sur la distribution marginale des effectifs
    if row.is_empty() {
        for &c in &counts {
            *row.entry(c).or_insert(0) += 1;
        }
    }

    let total: u32 = row.values().sum();
    let next_state_probs: BTreeMap<u32, f64> = row
        .iter()
        .map(|(&state, &n)| (state, n as f64 / total as f64))
        .collect();

    // Argmax, à égalité l'effectif le plus petit
    let (predicted_next_count, confidence) = next_state_probs
        .iter()
        .fold((0u32, 0.0f64), |best, (&state, &p)| if p > best.1 { (state, p) } else { best });

    PalaceState {
        palace,
        current_count,
        previous_count,
        next_state_probs,
        trend_type: classify(palace, draws),
        predicted_next_count,
        confidence,
    }
}

fn classify(palace: Palace, draws: &[Draw]) -> PalaceTrend {
    let latest: Vec<u8> = match draws.first() {
        Some(d) => palace.numbers_in(d).collect(),
        None => return PalaceTrend::Vacuum,
    };
    if latest.is_empty() {
        return PalaceTrend::Vacuum;
    }
    let previous: Vec<u8> = match draws.get(1) {
        Some(d) => palace.numbers_in(d).collect(),
        None => return PalaceTrend::Fluctuating,
    };

    if latest.iter().any(|n| previous.contains(n)) {
        PalaceTrend::Repeat
    } else if latest
        .iter()
        .any(|&n| previous.iter().any(|&p| n.abs_diff(p) == 1))
    {
        PalaceTrend::Diagonal
    } else {
        PalaceTrend::Fluctuating
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::make_draws;

    #[test]
    fn test_kl8_palaces() {
        let p = palaces(Pool::KL8);
        assert_eq!(p.len(), 9);
        assert_eq!((p[0].start, p[0].end), (1, 9));
        assert_eq!((p[1].start, p[1].end), (10, 18));
        assert_eq!((p[8].start, p[8].end), (73, 80));
        assert!(p[4].contains(37) && p[4].contains(45) && !p[4].contains(46));
    }

    #[test]
    fn test_palaces_small_pool() {
        let p = palaces(Pool::new(10, 3));
        assert_eq!(p.len(), 2);
        assert_eq!((p[1].start, p[1].end), (10, 10));
    }

    #[test]
    fn test_trend_types() {
        let pool = Pool::new(18, 2);
        // Plage 1 : 3 puis 3 -> répétition ; plage 2 : 12 puis 11 -> diagonale
        let draws = make_draws(&[&[3, 12], &[3, 11]]);
        let states = palace_states(&draws, pool);
        assert_eq!(states[0].trend_type, PalaceTrend::Repeat);
        assert_eq!(states[1].trend_type, PalaceTrend::Diagonal);

        let draws = make_draws(&[&[1, 2], &[5, 15]]);
        let states = palace_states(&draws, pool);
        assert_eq!(states[0].trend_type, PalaceTrend::Fluctuating);
        assert_eq!(states[1].trend_type, PalaceTrend::Vacuum);
    }

    #[test]
    fn test_transition_prediction() {
        let pool = Pool::new(18, 2);
        // Effectifs plage 1 (récent -> ancien) : 2, 1, 2, 1, 2
        let draws = make_draws(&[&[1, 2], &[1, 10], &[1, 2], &[1, 10], &[1, 2]]);
        let states = palace_states(&draws, pool);
        let first = &states[0];
        assert_eq!(first.current_count, 2);
        assert_eq!(first.previous_count, 1);
        // Depuis l'état 2, on est toujours passé à 1
        assert_eq!(first.predicted_next_count, 1);
        assert!((first.confidence - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unseen_state_uses_marginal() {
        let pool = Pool::new(18, 3);
        // L'état courant (3) n'a jamais été quitté
        let draws = make_draws(&[&[1, 2, 3], &[1, 10, 11], &[1, 10, 12]]);
        let states = palace_states(&draws, pool);
        let first = &states[0];
        assert_eq!(first.current_count, 3);
        let sum: f64 = first.next_state_probs.values().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert_eq!(first.predicted_next_count, 1);
    }

    #[test]
    fn test_empty_history() {
        let states = palace_states(&[], Pool::KL8);
        assert_eq!(states.len(), 9);
        for s in &states {
            assert_eq!(s.current_count, 0);
            assert_eq!(s.trend_type, PalaceTrend::Vacuum);
            assert!(s.next_state_probs.is_empty());
            assert_eq!(s.confidence, 0.0);
        }
    }
}
