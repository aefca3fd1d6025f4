//! Risk-scoring engine: two detection strategies behind one `Detector`
//! interface, so callers pick or combine strategies without duplicating
//! profile/session bookkeeping.

pub mod profile;
pub mod rules;
pub mod similarity;

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::config::{Config, ScoreWeights};
use crate::enrich::GeoIpClient;
use crate::error::SentinelError;
use crate::models::{AlertAction, AnomalyAlert, LoginEvent};
use crate::store::{AlertLog, ProfileStore, SessionStore};

/// What a detector concluded about one login event.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub suspicious: bool,
    /// Strategy-specific score: weighted similarity in [0, 1] for the
    /// baseline detector (lower is worse), accumulated points for the rule
    /// detector (higher is worse).
    pub score: f64,
    pub reasons: Vec<String>,
    pub risk_factors: Vec<String>,
    /// Present when the rule detector fired an alert for this event.
    pub alert: Option<AnomalyAlert>,
}

/// A login-risk detection strategy. Implementations own their state updates:
/// assessing an event also advances the underlying baseline or session.
#[async_trait]
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;

    async fn assess(&self, event: &LoginEvent) -> Result<Assessment, SentinelError>;
}

/// Compares events against learned per-site/per-user baselines, then folds
/// the event into the baseline so it keeps adapting. The fold happens
/// whether or not the event looked suspicious; a compromised account can
/// therefore drift its own baseline, which is an accepted property of this
/// strategy, not an oversight.
pub struct BaselineSimilarityDetector {
    profiles: Arc<ProfileStore>,
    weights: ScoreWeights,
    threshold: f64,
    geoip: Option<GeoIpClient>,
}

impl BaselineSimilarityDetector {
    pub fn new(profiles: Arc<ProfileStore>, config: &Config) -> Self {
        let geoip = if config.geoip_enabled {
            Some(GeoIpClient::new())
        } else {
            None
        };
        BaselineSimilarityDetector {
            profiles,
            weights: config.weights,
            threshold: config.similarity_threshold,
            geoip,
        }
    }
}

#[async_trait]
impl Detector for BaselineSimilarityDetector {
    fn name(&self) -> &'static str {
        "baseline_similarity"
    }

    async fn assess(&self, event: &LoginEvent) -> Result<Assessment, SentinelError> {
        let profile = self.profiles.get(&event.site, &event.username).ok_or_else(|| {
            SentinelError::ProfileNotFound {
                site: event.site.clone(),
                username: event.username.clone(),
            }
        })?;

        let mut report = similarity::score_event(&profile, event, &self.weights, self.threshold);

        if let Some(geoip) = &self.geoip {
            if let Some(ip) = &event.ip_address {
                if let Some(reason) = geoip.check(ip, &profile).await {
                    report.reasons.push(reason);
                    report.risk_factors = similarity::risk_factors(&report.reasons);
                }
            }
        }

        debug!(
            "scored {}/{}: similarity {} ({} reasons)",
            event.site,
            event.username,
            report.similarity,
            report.reasons.len()
        );

        // Keep the baseline adapting, suspicious or not.
        self.profiles.record_event(&event.site, &event.username, event)?;

        Ok(Assessment {
            suspicious: report.suspicious,
            score: report.similarity,
            reasons: report.reasons,
            risk_factors: report.risk_factors,
            alert: None,
        })
    }
}

/// Scores events against rolling per-username session state with additive
/// point rules, fires alerts past the threshold, and drives the session
/// lock state machine.
pub struct SessionRuleDetector {
    sessions: Arc<SessionStore>,
    alerts: Arc<AlertLog>,
    allowed_locations: Vec<String>,
    rule_threshold: f64,
    severity_threshold: f64,
}

impl SessionRuleDetector {
    pub fn new(sessions: Arc<SessionStore>, alerts: Arc<AlertLog>, config: &Config) -> Self {
        SessionRuleDetector {
            sessions,
            alerts,
            allowed_locations: config.allowed_locations.clone(),
            rule_threshold: config.rule_threshold,
            severity_threshold: config.severity_threshold,
        }
    }
}

#[async_trait]
impl Detector for SessionRuleDetector {
    fn name(&self) -> &'static str {
        "session_rule"
    }

    async fn assess(&self, event: &LoginEvent) -> Result<Assessment, SentinelError> {
        let (outcome, alert) = self.sessions.with_session(&event.username, |session| {
            if session.locked {
                return Err(SentinelError::AccountLocked);
            }

            let outcome = rules::evaluate(event, session, &self.allowed_locations);
            let alert = rules::alert_for(
                &outcome,
                &event.username,
                self.rule_threshold,
                self.severity_threshold,
            );

            if let Some(alert) = &alert {
                if alert.action == AlertAction::LockAccount {
                    session.locked = true;
                }
            }

            // Last-seen fields track every accepted event, alert or not.
            session.last_location = event.location.clone();
            session.last_device_fingerprint = event.device_fingerprint.clone();
            session.last_access_time = event.access_time.clone();

            Ok((outcome, alert))
        })?;

        if let Some(alert) = &alert {
            debug!(
                "alert {} for {}: score {} severity {:?}",
                alert.alert_id, event.username, alert.score, alert.severity
            );
            self.alerts.append(alert.clone());
        }

        Ok(Assessment {
            suspicious: alert.is_some(),
            score: outcome.score,
            reasons: outcome.reasons,
            risk_factors: outcome.risk_factors,
            alert,
        })
    }
}
