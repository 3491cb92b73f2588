//! Frontière vers un service externe d'évaluation de stratégie.
//! Aucun service réel n'est appelé : les implémentations fournies rejouent une
//! réponse enregistrée ou échouent, ce qui déclenche l'évaluation de repli.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use kl8_db::models::Draw;

use crate::features::{numbers_with_level, HotLevel, NumberFeature};
use crate::ranking::Confidence;

pub const RECENT_DRAWS: usize = 5;
pub const MIN_ALERTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRequest {
    pub strategy: String,
    pub recent_draws: Vec<Draw>,
    pub hot_numbers: Vec<u8>,
    pub cold_numbers: Vec<u8>,
}

impl AssessmentRequest {
    pub fn new(strategy: &str, draws: &[Draw], features: &[NumberFeature]) -> Self {
        Self {
            strategy: strategy.to_string(),
            recent_draws: draws.iter().take(RECENT_DRAWS).cloned().collect(),
            hot_numbers: numbers_with_level(features, HotLevel::Hot),
            cold_numbers: numbers_with_level(features, HotLevel::Cold),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentTrend {
    #[serde(alias = "上升")]
    Rising,
    #[serde(alias = "下降")]
    Falling,
    #[serde(alias = "震荡")]
    Oscillating,
}

impl std::fmt::Display for AssessmentTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssessmentTrend::Rising => write!(f, "HAUSSE"),
            AssessmentTrend::Falling => write!(f, "BAISSE"),
            AssessmentTrend::Oscillating => write!(f, "OSCILLATION"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Note globale dans [0, 100].
    pub score: f64,
    pub confidence: Confidence,
    pub trend: AssessmentTrend,
    pub alerts: Vec<String>,
    pub reasoning: String,
}

impl Assessment {
    /// Évaluation hors ligne substituée à toute réponse en échec.
    pub fn fallback() -> Self {
        Self {
            score: 60.0,
            confidence: Confidence::Medium,
            trend: AssessmentTrend::Oscillating,
            alerts: vec![
                "Service d'évaluation indisponible".to_string(),
                "Vérifier la connexion réseau".to_string(),
                "Mode d'évaluation manuel activé".to_string(),
            ],
            reasoning: "Évaluation hors ligne : la stratégie n'a pas été soumise au service. \
                        Surveiller le déséquilibre récent entre numéros chauds et froids."
                .to_string(),
        }
    }
}

/// Texte de requête envoyé au service d'évaluation.
pub fn build_prompt(request: &AssessmentRequest) -> String {
    let join = |numbers: &[u8]| {
        numbers
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let recent = request
        .recent_draws
        .iter()
        .map(|d| format!("  {} : {}", d.issue, join(&d.numbers[..])))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Évaluer la stratégie KL8 suivante.\n\
         Stratégie : \"{}\"\n\
         Numéros chauds : {}\n\
         Numéros froids : {}\n\
         {} derniers tirages :\n{}\n\
         Répondre en JSON avec les champs score (0-100), confidence (high|medium|low), \
         trend (rising|falling|oscillating), alerts (au moins {}) et reasoning.",
        request.strategy,
        join(&request.hot_numbers[..]),
        join(&request.cold_numbers[..]),
        request.recent_draws.len(),
        recent,
        MIN_ALERTS,
    )
}

/// Décode et valide une réponse JSON du service.
pub fn parse_assessment(json: &str) -> Result<Assessment> {
    let assessment: Assessment =
        serde_json::from_str(json.trim()).context("Réponse d'évaluation illisible")?;
    if !assessment.score.is_finite() || !(0.0..=100.0).contains(&assessment.score) {
        bail!("Score hors limites : {}", assessment.score);
    }
    if assessment.alerts.len() < MIN_ALERTS {
        bail!(
            "{} alertes reçues, au moins {} attendues",
            assessment.alerts.len(),
            MIN_ALERTS
        );
    }
    Ok(assessment)
}

pub trait StrategyAssessor {
    fn name(&self) -> &str;
    fn assess(&self, request: &AssessmentRequest) -> Result<Assessment>;
}

/// Toute erreur du service est journalisée puis remplacée par `Assessment::fallback()`.
pub fn assess_or_fallback(assessor: &dyn StrategyAssessor, request: &AssessmentRequest) -> Assessment {
    match assessor.assess(request) {
        Ok(assessment) => assessment,
        Err(e) => {
            tracing::warn!(assessor = assessor.name(), error = %format!("{:#}", e), "évaluation de repli");
            Assessment::fallback()
        }
    }
}

/// Rejoue une réponse JSON enregistrée dans un fichier.
pub struct RecordedAssessor {
    path: PathBuf,
}

impl RecordedAssessor {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl StrategyAssessor for RecordedAssessor {
    fn name(&self) -> &str {
        "recorded"
    }

    fn assess(&self, request: &AssessmentRequest) -> Result<Assessment> {
        tracing::debug!(prompt_len = build_prompt(request).len(), path = %self.path.display(), "réponse enregistrée");
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Impossible de lire {}", self.path.display()))?;
        parse_assessment(&json)
    }
}

/// Aucun service configuré : échoue systématiquement.
#[derive(Debug, Default)]
pub struct OfflineAssessor;

impl StrategyAssessor for OfflineAssessor {
    fn name(&self) -> &str {
        "offline"
    }

    fn assess(&self, _request: &AssessmentRequest) -> Result<Assessment> {
        bail!("Aucun service d'évaluation configuré")
    }
}
