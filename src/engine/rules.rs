//! Rule-based session scoring: additive point rules evaluated against the
//! current per-user session state, and the alert engine that turns a
//! crossing score into an AnomalyAlert.

use crate::engine::profile::extract_hour;
use crate::models::{AlertAction, AlertStatus, AnomalyAlert, LoginEvent, Severity, UserSession};

/// Typing speeds above this many characters per minute are flagged.
const TYPING_SPEED_CEILING: f64 = 200.0;

/// Outcome of running the rule set over one event.
#[derive(Debug, Clone, Default)]
pub struct RuleOutcome {
    /// Accumulated points; rules stack and there is no cap.
    pub score: f64,
    pub reasons: Vec<String>,
    pub risk_factors: Vec<String>,
}

/// Parse an hour out of an access time that may be ISO-8601 or bare
/// "HH:MM". Malformed values skip the off-hours rule rather than erroring.
fn clock_hour(access_time: &str) -> Option<u32> {
    if access_time.contains('T') {
        extract_hour(access_time)
    } else {
        access_time.split(':').next()?.trim().parse().ok()
    }
}

/// Evaluate the fixed rule set. Each rule contributes independently; a
/// single event can trip all of them.
pub fn evaluate(
    event: &LoginEvent,
    session: &UserSession,
    allowed_locations: &[String],
) -> RuleOutcome {
    let mut outcome = RuleOutcome::default();

    if let Some(speed) = event.typing_speed {
        if speed > TYPING_SPEED_CEILING {
            outcome.reasons.push("Unusually high typing speed".to_string());
            outcome.risk_factors.push("typing_speed".to_string());
            outcome.score += 0.3;
        }
    }

    if let Some(location) = &event.location {
        if !allowed_locations.iter().any(|allowed| allowed == location) {
            outcome.reasons.push(format!("Unusual login location: {}", location));
            outcome.risk_factors.push("location".to_string());
            outcome.score += 0.4;
        }
    }

    if let (Some(previous), Some(current)) =
        (&session.last_device_fingerprint, &event.device_fingerprint)
    {
        if previous != current {
            outcome.reasons.push("Device fingerprint changed".to_string());
            outcome.risk_factors.push("device_fingerprint".to_string());
            outcome.score += 0.3;
        }
    }

    if let (Some(previous), Some(current)) = (&session.last_location, &event.location) {
        if previous != current {
            outcome
                .reasons
                .push(format!("Sudden location shift from {} to {}", previous, current));
            outcome.risk_factors.push("location_shift".to_string());
            outcome.score += 0.4;
        }
    }

    if let Some(access_time) = &event.access_time {
        if let Some(hour) = clock_hour(access_time) {
            if hour < 6 || hour > 22 {
                outcome.reasons.push(format!("Unusual access time: {}", access_time));
                outcome.risk_factors.push("access_time".to_string());
                outcome.score += 0.2;
            }
        }
    }

    outcome
}

/// Turn a rule outcome into an alert when it crosses the threshold.
///
/// Scores strictly above `severity_threshold` escalate to high severity and
/// an account lock; anything else at or above `rule_threshold` asks for
/// re-authentication.
pub fn alert_for(
    outcome: &RuleOutcome,
    username: &str,
    rule_threshold: f64,
    severity_threshold: f64,
) -> Option<AnomalyAlert> {
    if outcome.score < rule_threshold {
        return None;
    }

    let severity = if outcome.score > severity_threshold {
        Severity::High
    } else {
        Severity::Medium
    };
    let action = match severity {
        Severity::High => AlertAction::LockAccount,
        Severity::Medium => AlertAction::ReAuthenticate,
    };

    Some(AnomalyAlert {
        alert_id: AnomalyAlert::generate_id(),
        created_at: crate::models::utc_timestamp(),
        severity,
        score: outcome.score,
        username: username.to_string(),
        reasons: outcome.reasons.clone(),
        risk_factors: outcome.risk_factors.clone(),
        status: AlertStatus::New,
        action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn event(typing: Option<f64>, location: Option<&str>, access_time: Option<&str>) -> LoginEvent {
        LoginEvent {
            site: String::new(),
            username: "alice".into(),
            device_fingerprint: Some("dev-abc".into()),
            typing_speed: typing,
            location: location.map(|s| s.to_string()),
            access_time: access_time.map(|s| s.to_string()),
            user_agent: None,
            ip_address: None,
            additional: HashMap::new(),
        }
    }

    fn allowed() -> Vec<String> {
        vec!["IN".into(), "US".into(), "UK".into()]
    }

    #[test]
    fn fast_typing_from_odd_location_scores_medium() {
        let session = UserSession::new("alice");
        let outcome = evaluate(&event(Some(250.0), Some("RU"), Some("10:00")), &session, &allowed());
        assert!((outcome.score - 0.7).abs() < 1e-9);
        assert_eq!(outcome.risk_factors, vec!["typing_speed", "location"]);

        let alert = alert_for(&outcome, "alice", 0.5, 0.8).unwrap();
        assert_eq!(alert.severity, Severity::Medium);
        assert_eq!(alert.action, AlertAction::ReAuthenticate);
        assert_eq!(alert.status, AlertStatus::New);
    }

    #[test]
    fn session_deltas_stack_to_high_severity() {
        let mut session = UserSession::new("alice");
        session.last_device_fingerprint = Some("dev-old".into());
        session.last_location = Some("US".into());

        let outcome = evaluate(&event(Some(250.0), Some("RU"), Some("10:00")), &session, &allowed());
        assert!((outcome.score - 1.4).abs() < 1e-9);
        assert_eq!(outcome.reasons.len(), 4);
        assert!(outcome
            .reasons
            .iter()
            .any(|r| r == "Sudden location shift from US to RU"));

        let alert = alert_for(&outcome, "alice", 0.5, 0.8).unwrap();
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.action, AlertAction::LockAccount);
    }

    #[test]
    fn off_hours_rule_accepts_both_time_formats() {
        let session = UserSession::new("alice");

        let outcome = evaluate(&event(None, Some("US"), Some("03:45")), &session, &allowed());
        assert!((outcome.score - 0.2).abs() < 1e-9);

        let outcome =
            evaluate(&event(None, Some("US"), Some("2025-01-01T23:10:00Z")), &session, &allowed());
        assert!((outcome.score - 0.2).abs() < 1e-9);

        // Malformed values skip the rule instead of erroring.
        let outcome = evaluate(&event(None, Some("US"), Some("noon-ish")), &session, &allowed());
        assert_eq!(outcome.score, 0.0);
    }

    #[test]
    fn quiet_event_scores_below_threshold() {
        let session = UserSession::new("alice");
        let outcome = evaluate(&event(Some(150.0), Some("US"), Some("10:00")), &session, &allowed());
        assert_eq!(outcome.score, 0.0);
        assert!(alert_for(&outcome, "alice", 0.5, 0.8).is_none());
    }

    #[test]
    fn boundary_hours_are_not_off_hours() {
        let session = UserSession::new("alice");
        for ts in ["06:00", "22:59"] {
            let outcome = evaluate(&event(None, Some("US"), Some(ts)), &session, &allowed());
            assert_eq!(outcome.score, 0.0, "hour in {} should be in-hours", ts);
        }
    }

    #[test]
    fn missing_fields_trip_no_rules() {
        let session = UserSession::new("alice");
        let bare = LoginEvent {
            site: String::new(),
            username: "alice".into(),
            device_fingerprint: None,
            typing_speed: None,
            location: None,
            access_time: None,
            user_agent: None,
            ip_address: None,
            additional: HashMap::new(),
        };
        let outcome = evaluate(&bare, &session, &allowed());
        assert_eq!(outcome.score, 0.0);
        assert!(outcome.reasons.is_empty());
    }
}
