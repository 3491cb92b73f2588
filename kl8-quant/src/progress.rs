use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    Running,
    Success,
    Error,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Running => write!(f, "EN COURS"),
            StepStatus::Success => write!(f, "OK"),
            StepStatus::Error => write!(f, "ERREUR"),
        }
    }
}

/// Reçoit les étapes du pipeline. N'a aucune influence sur les résultats.
pub trait ProgressSink {
    fn report(&mut self, message: &str, status: StepStatus);
}

/// Journalise l'étape puis la transmet au récepteur.
pub fn emit(sink: &mut dyn ProgressSink, message: &str, status: StepStatus) {
    match status {
        StepStatus::Running => tracing::debug!(%status, "{}", message),
        StepStatus::Success => tracing::info!(%status, "{}", message),
        StepStatus::Error => tracing::warn!(%status, "{}", message),
    }
    sink.report(message, status);
}

/// Récepteur silencieux : seuls les événements `tracing` subsistent.
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&mut self, _message: &str, _status: StepStatus) {}
}

/// Conserve les étapes en mémoire, dans l'ordre d'émission.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub steps: Vec<(String, StepStatus)>,
}

impl ProgressSink for RecordingSink {
    fn report(&mut self, message: &str, status: StepStatus) {
        self.steps.push((message.to_string(), status));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let mut sink = RecordingSink::default();
        emit(&mut sink, "a", StepStatus::Running);
        emit(&mut sink, "b", StepStatus::Success);
        assert_eq!(
            sink.steps,
            vec![
                ("a".to_string(), StepStatus::Running),
                ("b".to_string(), StepStatus::Success)
            ]
        );
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&StepStatus::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
    }
}
