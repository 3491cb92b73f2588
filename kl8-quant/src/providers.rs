//! Sources de données déclarées. L'interrogation est simulée : aucune requête
//! réseau n'est émise et chaque source répond toujours avec succès.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::progress::{emit, ProgressSink, StepStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub name: String,
    pub url: String,
    /// Poids de confiance de la source, dans (0, 1].
    pub weight: f64,
}

impl Provider {
    pub fn new(name: &str, url: &str, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            weight,
        }
    }
}

pub fn default_providers() -> Vec<Provider> {
    vec![
        Provider::new("NationalLotteryAPI", "https://m.cwl.gov.cn/api/kw8", 1.0),
        Provider::new("CaijingScraper", "https://data.cjcp.com.cn/kl8", 0.8),
        Provider::new("Lottery365Sync", "https://api.lottery365.com", 0.7),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollReport {
    pub provider: String,
    pub latest_issue: String,
    pub ok: bool,
}

/// Interroge les sources l'une après l'autre, avec `delay` d'attente par source.
pub fn poll_providers(
    providers: &[Provider],
    latest_issue: &str,
    delay: Duration,
    sink: &mut dyn ProgressSink,
) -> Vec<PollReport> {
    let mut reports = Vec::with_capacity(providers.len());
    for provider in providers {
        emit(
            sink,
            &format!("[POLLING] requête vers {} ({})", provider.name, provider.url),
            StepStatus::Running,
        );
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        emit(
            sink,
            &format!("[SUCCESS] {} a répondu, période {}", provider.name, latest_issue),
            StepStatus::Running,
        );
        reports.push(PollReport {
            provider: provider.name.clone(),
            latest_issue: latest_issue.to_string(),
            ok: true,
        });
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::RecordingSink;

    #[test]
    fn test_default_providers() {
        let providers = default_providers();
        assert_eq!(providers.len(), 3);
        assert_eq!(providers[0].name, "NationalLotteryAPI");
        assert!((providers[1].weight - 0.8).abs() < 1e-12);
        assert!(providers.iter().all(|p| p.weight > 0.0 && p.weight <= 1.0));
    }

    #[test]
    fn test_poll_is_sequential_and_succeeds() {
        let mut sink = RecordingSink::default();
        let reports = poll_providers(&default_providers(), "2026017", Duration::ZERO, &mut sink);
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.ok && r.latest_issue == "2026017"));
        assert_eq!(sink.steps.len(), 6);
        assert!(sink.steps[0].0.contains("NationalLotteryAPI"));
        assert!(sink.steps[5].0.contains("Lottery365Sync"));
    }
}
