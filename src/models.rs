use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Define core types
pub type Site = String;
pub type Username = String;
/// Profiles keyed by site, then username. Matches the persisted JSON layout.
pub type ProfileMap = HashMap<Site, HashMap<Username, Profile>>;

/// A login attempt as submitted to the reporter service. Every behavioral
/// field is optional; scoring degrades to a neutral default for anything
/// missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginEvent {
    pub site: String,
    pub username: String,
    #[serde(default)]
    pub device_fingerprint: Option<String>,
    #[serde(default)]
    pub typing_speed: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    /// ISO-8601 timestamp or bare "HH:MM".
    #[serde(default)]
    pub access_time: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub additional: HashMap<String, serde_json::Value>,
}

/// A login event on the backend intake wire: carries an event id and
/// submission timestamp (synthesized by the forwarder when the event came
/// from the reporter).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeEvent {
    pub event_id: String,
    pub timestamp: String,
    pub username: String,
    pub device_fingerprint: String,
    pub location: String,
    pub typing_speed: f64,
    pub access_time: String,
    #[serde(default)]
    pub additional: HashMap<String, serde_json::Value>,
}

impl IntakeEvent {
    /// View the intake payload as the common event model the detectors
    /// consume. Empty strings are treated as absent.
    pub fn to_login_event(&self) -> LoginEvent {
        fn non_empty(s: &str) -> Option<String> {
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }

        LoginEvent {
            site: String::new(),
            username: self.username.clone(),
            device_fingerprint: non_empty(&self.device_fingerprint),
            typing_speed: Some(self.typing_speed),
            location: non_empty(&self.location),
            access_time: non_empty(&self.access_time),
            user_agent: None,
            ip_address: None,
            additional: self.additional.clone(),
        }
    }
}

/// Learned behavioral baseline for one site/username pair.
///
/// `std_typing_speed` is computed once at batch creation (≥2 typing samples)
/// and is not recomputed by incremental folds; the mean keeps adapting while
/// the spread stays frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub avg_typing_speed: Option<f64>,
    pub std_typing_speed: Option<f64>,
    pub device_fingerprints: Vec<String>,
    pub locations: Vec<String>,
    pub user_agents: Vec<String>,
    pub ip_addresses: Vec<String>,
    /// Hours of day (0..=23) historically seen, sorted ascending.
    pub typical_hours: Vec<u32>,
    pub samples: u64,
}

/// Rolling per-username session state used by the rule detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub username: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub last_location: Option<String>,
    #[serde(default)]
    pub last_device_fingerprint: Option<String>,
    #[serde(default)]
    pub last_access_time: Option<String>,
}

impl UserSession {
    pub fn new(username: &str) -> Self {
        UserSession {
            username: username.to_string(),
            locked: false,
            last_location: None,
            last_device_fingerprint: None,
            last_access_time: None,
        }
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

/// Action recommended by an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertAction {
    ReAuthenticate,
    LockAccount,
}

/// Lifecycle status of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    New,
}

/// An anomaly alert. Immutable once created; lives in the append-only log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyAlert {
    pub alert_id: String,
    pub created_at: String,
    pub severity: Severity,
    pub score: f64,
    pub username: String,
    pub reasons: Vec<String>,
    pub risk_factors: Vec<String>,
    pub status: AlertStatus,
    pub action: AlertAction,
}

impl AnomalyAlert {
    /// Alert ids look like `A-20250101-3f9a1c`: date bucket plus a short
    /// random suffix.
    pub fn generate_id() -> String {
        let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
        format!("A-{}-{}", Utc::now().format("%Y%m%d"), suffix)
    }
}

/// Current UTC time in the ISO-8601 `...Z` form used on the wire.
pub fn utc_timestamp() -> String {
    format!("{}Z", Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f"))
}

/// Payload for creating a baseline profile from a batch of events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileCreate {
    pub site: String,
    pub username: String,
    pub events: Vec<LoginEvent>,
}

/// Response of the reporter's `/check` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub suspicious: bool,
    pub similarity: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub forwarded: bool,
}
