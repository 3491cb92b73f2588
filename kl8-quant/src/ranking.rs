use serde::{Deserialize, Serialize};

use crate::features::NumberFeature;

pub const ANCHOR_FOLLOW_SIZE: usize = 6;
pub const CORE_ANCHOR_SIZE: usize = 4;
pub const COVERING_SIZE: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredNumber {
    pub number: u8,
    pub score: f64,
}

/// Classement global : toutes les sélections sont des préfixes de cet ordre unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    order: Vec<ScoredNumber>,
}

impl Ranking {
    pub fn order(&self) -> &[ScoredNumber] {
        &self.order
    }

    pub fn top_k(&self, k: usize) -> Vec<u8> {
        self.order.iter().take(k).map(|s| s.number).collect()
    }

    pub fn anchor_follow(&self) -> Vec<u8> {
        self.top_k(ANCHOR_FOLLOW_SIZE)
    }

    pub fn core_anchor(&self) -> Vec<u8> {
        self.top_k(CORE_ANCHOR_SIZE)
    }

    pub fn covering(&self) -> Vec<u8> {
        self.top_k(COVERING_SIZE)
    }

    pub fn position(&self, number: u8) -> Option<usize> {
        self.order.iter().position(|s| s.number == number)
    }

    pub fn mean_score(&self, k: usize) -> f64 {
        let k = k.min(self.order.len());
        if k == 0 {
            return 0.0;
        }
        self.order[..k].iter().map(|s| s.score).sum::<f64>() / k as f64
    }
}

/// Score = markov + bayes, tri décroissant stable : à score égal l'ordre croissant
/// des numéros est conservé.
pub fn rank(features: &[NumberFeature]) -> Ranking {
    let mut order: Vec<ScoredNumber> = features
        .iter()
        .map(|f| ScoredNumber {
            number: f.number,
            score: f.score(),
        })
        .collect();
    order.sort_by_key(|s| s.number);
    order.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ranking { order }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[serde(alias = "高")]
    High,
    #[serde(alias = "中")]
    Medium,
    #[serde(alias = "低")]
    Low,
}

impl Confidence {
    /// Rapport entre le score moyen de la couverture et le score moyen global.
    pub fn from_ranking(ranking: &Ranking) -> Self {
        let overall = ranking.mean_score(ranking.order.len());
        if overall <= 0.0 {
            return Confidence::Low;
        }
        let ratio = ranking.mean_score(COVERING_SIZE) / overall;
        if ratio >= 1.5 {
            Confidence::High
        } else if ratio >= 1.2 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "HAUTE"),
            Confidence::Medium => write!(f, "MOYENNE"),
            Confidence::Low => write!(f, "FAIBLE"),
        }
    }
}
