use serde::{Deserialize, Serialize};

use kl8_db::models::Draw;

pub const TAIL_WINDOW: usize = 100;

/// Chiffres de terminaison considérés « premiers » (1 inclus, par convention de jeu).
const PRIME_TAILS: [u8; 5] = [1, 2, 3, 5, 7];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Element {
    Wood,
    Fire,
    Earth,
    Metal,
    Water,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TailColor {
    Red,
    Green,
    Blue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailProperties {
    pub size: SizeBucket,
    pub is_odd: bool,
    pub is_prime: bool,
    pub is_yang: bool,
    pub element: Element,
    pub color: TailColor,
}

impl TailProperties {
    /// Table fixe, indépendante de l'historique.
    pub fn of(tail: u8) -> Self {
        let tail = tail % 10;
        let size = match tail {
            0..=2 => SizeBucket::Small,
            3..=6 => SizeBucket::Medium,
            _ => SizeBucket::Large,
        };
        let element = match tail {
            1 | 2 => Element::Wood,
            3 | 4 => Element::Fire,
            5 | 6 => Element::Earth,
            7 | 8 => Element::Metal,
            _ => Element::Water,
        };
        let color = match tail {
            1 | 4 | 7 => TailColor::Red,
            2 | 5 | 8 => TailColor::Green,
            _ => TailColor::Blue,
        };
        Self {
            size,
            is_odd: tail % 2 == 1,
            is_prime: PRIME_TAILS.contains(&tail),
            is_yang: tail % 2 == 1,
            element,
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TailFeature {
    pub tail: u8,
    pub count: u32,
    pub properties: TailProperties,
    pub trend_score: f64,
}

/// Une entrée par chiffre 0..=9, comptée sur les 100 tirages les plus récents.
pub fn tail_features(draws: &[Draw]) -> Vec<TailFeature> {
    let recent = &draws[..TAIL_WINDOW.min(draws.len())];

    (0..=9u8)
        .map(|tail| {
            let count = recent
                .iter()
                .map(|d| d.numbers.iter().filter(|&&n| n % 10 == tail).count() as u32)
                .sum::<u32>();
            let trend_score = if recent.is_empty() {
                0.0
            } else {
                count as f64 / recent.len() as f64 * 10.0
            };
            TailFeature {
                tail,
                count,
                properties: TailProperties::of(tail),
                trend_score,
            }
        })
        .collect()
}

impl std::fmt::Display for SizeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeBucket::Small => write!(f, "petit"),
            SizeBucket::Medium => write!(f, "moyen"),
            SizeBucket::Large => write!(f, "grand"),
        }
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Wood => write!(f, "bois"),
            Element::Fire => write!(f, "feu"),
            Element::Earth => write!(f, "terre"),
            Element::Metal => write!(f, "métal"),
            Element::Water => write!(f, "eau"),
        }
    }
}

impl std::fmt::Display for TailColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TailColor::Red => write!(f, "rouge"),
            TailColor::Green => write!(f, "vert"),
            TailColor::Blue => write!(f, "bleu"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::make_draws;

    #[test]
    fn test_tail_properties_table() {
        let zero = TailProperties::of(0);
        assert_eq!(zero.size, SizeBucket::Small);
        assert!(!zero.is_odd);
        assert!(!zero.is_prime);
        assert_eq!(zero.element, Element::Water);
        assert_eq!(zero.color, TailColor::Blue);

        let one = TailProperties::of(1);
        assert!(one.is_prime && one.is_odd && one.is_yang);
        assert_eq!(one.element, Element::Wood);
        assert_eq!(one.color, TailColor::Red);

        assert_eq!(TailProperties::of(3).size, SizeBucket::Medium);
        assert_eq!(TailProperties::of(6).size, SizeBucket::Medium);
        assert_eq!(TailProperties::of(7).size, SizeBucket::Large);
        assert!(!TailProperties::of(9).is_prime);
        assert_eq!(TailProperties::of(8).color, TailColor::Green);
        assert_eq!(TailProperties::of(9).element, Element::Water);
    }

    #[test]
    fn test_tail_counts() {
        let draws = make_draws(&[&[1, 11, 20], &[21, 30, 45]]);
        let tails = tail_features(&draws);
        assert_eq!(tails.len(), 10);
        assert_eq!(tails[0].count, 2);
        assert_eq!(tails[1].count, 3);
        assert_eq!(tails[5].count, 1);
        assert!((tails[1].trend_score - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_tail_total_matches_entries() {
        let draws = crate::generator::generate(
            &[],
            &crate::generator::GeneratorConfig { years_back: 1, ..Default::default() },
            kl8_db::models::Pool::KL8,
        );
        let tails = tail_features(&draws);
        let total: u32 = tails.iter().map(|t| t.count).sum();
        assert_eq!(total, 100 * 20);
    }

    #[test]
    fn test_tail_empty_history() {
        let tails = tail_features(&[]);
        assert!(tails.iter().all(|t| t.count == 0 && t.trend_score == 0.0));
    }
}
