pub mod compute;

use serde::{Deserialize, Serialize};
use kl8_db::models::{Draw, Pool};

pub const HOT_THRESHOLD: f64 = 0.30;
pub const WARM_THRESHOLD: f64 = 0.15;

pub const SHORT_WINDOW: usize = 30;
pub const LONG_WINDOW: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HotLevel {
    Hot,
    Warm,
    Cold,
}

impl HotLevel {
    pub fn from_ma30(ma30: f64) -> Self {
        if ma30 >= HOT_THRESHOLD {
            HotLevel::Hot
        } else if ma30 >= WARM_THRESHOLD {
            HotLevel::Warm
        } else {
            HotLevel::Cold
        }
    }
}

impl std::fmt::Display for HotLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HotLevel::Hot => write!(f, "CHAUD"),
            HotLevel::Warm => write!(f, "TIÈDE"),
            HotLevel::Cold => write!(f, "FROID"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Rising,
    Falling,
    Flat,
}

impl Trend {
    /// Compare la moyenne courte (MA30) à la moyenne longue (MA100).
    pub fn from_averages(short: f64, long: f64) -> Self {
        if short > long {
            Trend::Rising
        } else if short < long {
            Trend::Falling
        } else {
            Trend::Flat
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Rising => write!(f, "↑"),
            Trend::Falling => write!(f, "↓"),
            Trend::Flat => write!(f, "="),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberFeature {
    pub number: u8,
    pub freq: u32,
    pub current_gap: u32,
    pub max_gap: u32,
    pub ma30: f64,
    pub hot_level: HotLevel,
    pub trend: Trend,
    pub cond_prob: f64,
    pub markov_prob: f64,
    pub bayesian_post: f64,
}

impl NumberFeature {
    pub fn score(&self) -> f64 {
        self.markov_prob + self.bayesian_post
    }
}

/// Une entrée par numéro de `1..=pool.size`, dans l'ordre croissant.
pub fn extract_features(draws: &[Draw], pool: Pool, anchors: &[u8]) -> Vec<NumberFeature> {
    compute::extract_features(draws, pool, anchors)
}

pub fn numbers_with_level(features: &[NumberFeature], level: HotLevel) -> Vec<u8> {
    features
        .iter()
        .filter(|f| f.hot_level == level)
        .map(|f| f.number)
        .collect()
}
