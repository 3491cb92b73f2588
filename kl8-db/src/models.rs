use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Un tirage : identifiant de période (ex. "2026017"), date ou libellé, numéros triés.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub issue: String,
    pub date: String,
    pub numbers: Vec<u8>,
}

impl Draw {
    pub fn new(issue: impl Into<String>, date: impl Into<String>, mut numbers: Vec<u8>) -> Self {
        numbers.sort_unstable();
        Self {
            issue: issue.into(),
            date: date.into(),
            numbers,
        }
    }

    /// Valeur numérique de l'identifiant, qui induit l'ordre total de l'historique.
    pub fn issue_key(&self) -> u64 {
        issue_key(&self.issue)
    }

    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }
}

/// Un identifiant non numérique est classé en dernier (clé 0).
pub fn issue_key(issue: &str) -> u64 {
    issue.trim().parse::<u64>().unwrap_or(0)
}

/// Trie du plus récent au plus ancien et retire les doublons d'identifiant.
/// En cas de doublon, la première occurrence rencontrée est conservée.
pub fn sort_newest_first(draws: Vec<Draw>) -> Vec<Draw> {
    let mut seen = std::collections::HashSet::new();
    let mut unique: Vec<Draw> = draws
        .into_iter()
        .filter(|d| seen.insert(d.issue.clone()))
        .collect();
    unique.sort_by(|a, b| b.issue_key().cmp(&a.issue_key()));
    unique
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub size: u8,
    pub pick_count: usize,
}

impl Pool {
    /// 20 numéros tirés parmi 80.
    pub const KL8: Pool = Pool {
        size: 80,
        pick_count: 20,
    };

    pub fn new(size: u8, pick_count: usize) -> Self {
        Self { size, pick_count }
    }

    pub fn numbers(&self) -> impl Iterator<Item = u8> {
        1..=self.size
    }

    pub fn validate_draw(&self, numbers: &[u8]) -> Result<()> {
        if numbers.len() != self.pick_count {
            bail!(
                "Tirage de {} numéros, {} attendus",
                numbers.len(),
                self.pick_count
            );
        }
        for &n in numbers {
            if n < 1 || n > self.size {
                bail!("Numéro {} hors limites (1-{})", n, self.size);
            }
        }
        for i in 0..numbers.len() {
            for j in (i + 1)..numbers.len() {
                if numbers[i] == numbers[j] {
                    bail!("Numéro en double : {}", numbers[i]);
                }
            }
        }
        Ok(())
    }
}

impl Default for Pool {
    fn default() -> Self {
        Pool::KL8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kl8_numbers() -> Vec<u8> {
        (1..=20).map(|i| i * 4).collect()
    }

    #[test]
    fn test_validate_draw_ok() {
        assert!(Pool::KL8.validate_draw(&kl8_numbers()).is_ok());
        assert!(Pool::new(10, 3).validate_draw(&[1, 4, 7]).is_ok());
    }

    #[test]
    fn test_validate_draw_out_of_range() {
        let mut numbers = kl8_numbers();
        numbers[0] = 0;
        assert!(Pool::KL8.validate_draw(&numbers).is_err());
        numbers[0] = 81;
        assert!(Pool::KL8.validate_draw(&numbers).is_err());
    }

    #[test]
    fn test_validate_draw_duplicate() {
        assert!(Pool::new(10, 3).validate_draw(&[1, 1, 7]).is_err());
    }

    #[test]
    fn test_validate_draw_wrong_count() {
        assert!(Pool::KL8.validate_draw(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_draw_new_sorts_numbers() {
        let draw = Draw::new("2026001", "2026-01-01", vec![7, 1, 4]);
        assert_eq!(draw.numbers, vec![1, 4, 7]);
        assert!(draw.contains(4));
        assert!(!draw.contains(5));
    }

    #[test]
    fn test_issue_key() {
        assert_eq!(issue_key("2026017"), 2026017);
        assert_eq!(issue_key(" 2025360 "), 2025360);
        assert_eq!(issue_key("abc"), 0);
    }

    #[test]
    fn test_sort_newest_first_dedup() {
        let draws = vec![
            Draw::new("2025001", "a", vec![1, 2, 3]),
            Draw::new("2026001", "b", vec![4, 5, 6]),
            Draw::new("2025001", "c", vec![7, 8, 9]),
            Draw::new("2025360", "d", vec![1, 5, 9]),
        ];
        let sorted = sort_newest_first(draws);
        let issues: Vec<&str> = sorted.iter().map(|d| d.issue.as_str()).collect();
        assert_eq!(issues, vec!["2026001", "2025360", "2025001"]);
        assert_eq!(sorted[2].date, "a");
    }

    #[test]
    fn test_pool_numbers() {
        assert_eq!(Pool::KL8.numbers().count(), 80);
        assert_eq!(Pool::new(10, 3).numbers().last(), Some(10));
    }
}
