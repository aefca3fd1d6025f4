//! Append-only alert log. Alerts are immutable once appended; readers get
//! point-in-time snapshots.

use parking_lot::RwLock;

use crate::models::AnomalyAlert;

#[derive(Default)]
pub struct AlertLog {
    alerts: RwLock<Vec<AnomalyAlert>>,
}

impl AlertLog {
    pub fn new() -> Self {
        AlertLog::default()
    }

    pub fn append(&self, alert: AnomalyAlert) {
        self.alerts.write().push(alert);
    }

    pub fn snapshot(&self) -> Vec<AnomalyAlert> {
        self.alerts.read().clone()
    }

    pub fn len(&self) -> usize {
        self.alerts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertAction, AlertStatus, Severity};

    fn alert(score: f64) -> AnomalyAlert {
        AnomalyAlert {
            alert_id: AnomalyAlert::generate_id(),
            created_at: crate::models::utc_timestamp(),
            severity: Severity::Medium,
            score,
            username: "alice".into(),
            reasons: vec!["Unusually high typing speed".into()],
            risk_factors: vec!["typing_speed".into()],
            status: AlertStatus::New,
            action: AlertAction::ReAuthenticate,
        }
    }

    #[test]
    fn appends_preserve_order() {
        let log = AlertLog::new();
        assert!(log.is_empty());

        log.append(alert(0.5));
        log.append(alert(0.7));

        let alerts = log.snapshot();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].score, 0.5);
        assert_eq!(alerts[1].score, 0.7);
    }
}
