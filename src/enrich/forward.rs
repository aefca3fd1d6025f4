//! Fire-and-forget forwarding of suspicious-login reports to the backend
//! intake. The scoring path only spawns the send; delivery is best-effort
//! with no retry, and failures are logged and swallowed.

use std::collections::HashSet;
use std::time::Duration;

use lazy_static::lazy_static;
use log::{debug, warn};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::models::{utc_timestamp, LoginEvent};

const FORWARD_TIMEOUT: Duration = Duration::from_secs(10);

lazy_static! {
    /// Top-level fields of the intake payload. Everything else in a report
    /// is carried under `additional`.
    static ref INTAKE_FIELDS: HashSet<&'static str> = [
        "event_id",
        "timestamp",
        "username",
        "device_fingerprint",
        "location",
        "typing_speed",
        "access_time",
    ]
    .into_iter()
    .collect();
}

/// Build the suspicious-login report for a flagged event.
pub fn build_report(
    event: &LoginEvent,
    similarity: f64,
    reasons: &[String],
    risk_factors: &[String],
) -> Map<String, Value> {
    let score = ((1.0 - similarity) * 100.0).round() / 100.0;
    let mut report = Map::new();
    report.insert("username".into(), json!(event.username));
    report.insert("site".into(), json!(event.site));
    report.insert("device_fingerprint".into(), json!(event.device_fingerprint));
    report.insert("typing_speed".into(), json!(event.typing_speed));
    report.insert("location".into(), json!(event.location));
    report.insert("access_time".into(), json!(event.access_time));
    report.insert("user_agent".into(), json!(event.user_agent));
    report.insert("ip_address".into(), json!(event.ip_address));
    report.insert("source".into(), json!("reporter"));
    report.insert("score".into(), json!(score));
    report.insert("reasons".into(), json!(reasons));
    report.insert("risk_factors".into(), json!(risk_factors));
    report
}

/// Shape a report into the backend intake's event model: synthetic event id
/// and timestamp, defaults for anything absent, and every field the intake
/// does not know about tucked under `additional`.
pub fn build_intake_payload(report: &Map<String, Value>) -> Value {
    let text = |key: &str| -> String {
        report.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
    };

    let event_id: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    let access_time = match text("access_time") {
        time if time.is_empty() => utc_timestamp(),
        time => time,
    };

    let additional: Map<String, Value> = report
        .iter()
        .filter(|(key, _)| !INTAKE_FIELDS.contains(key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    json!({
        "event_id": format!("evt-{}", event_id),
        "timestamp": utc_timestamp(),
        "username": text("username"),
        "device_fingerprint": text("device_fingerprint"),
        "location": text("location"),
        "typing_speed": report.get("typing_speed").and_then(Value::as_f64).unwrap_or(0.0),
        "access_time": access_time,
        "additional": additional,
    })
}

/// Owns the outbound client and target URL for intake forwarding.
pub struct Forwarder {
    client: reqwest::Client,
    url: String,
}

impl Forwarder {
    pub fn new(url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FORWARD_TIMEOUT)
            .build()
            .unwrap_or_default();
        Forwarder { client, url: url.to_string() }
    }

    /// Enqueue a report for delivery and return immediately.
    pub fn spawn_forward(&self, report: Map<String, Value>) {
        let client = self.client.clone();
        let url = self.url.clone();
        tokio::spawn(async move {
            let payload = build_intake_payload(&report);
            match client.post(&url).json(&payload).send().await {
                Ok(response) => {
                    debug!("forwarded suspicious-login report: status {}", response.status());
                }
                Err(e) => {
                    warn!("failed to forward suspicious-login report: {}", e);
                }
            }
        });
    }
}
