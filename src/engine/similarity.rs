//! Baseline-similarity scoring: six weighted per-feature match scores
//! compared against a learned profile, with human-readable reasons for
//! every mismatch.

use crate::config::ScoreWeights;
use crate::engine::profile::extract_hour;
use crate::models::{LoginEvent, Profile};

/// Result of scoring one event against its baseline.
#[derive(Debug, Clone)]
pub struct SimilarityReport {
    pub suspicious: bool,
    /// Weighted similarity in [0, 1], rounded to 3 decimals. Lower means
    /// more suspicious.
    pub similarity: f64,
    pub reasons: Vec<String>,
    pub risk_factors: Vec<String>,
}

/// Token-set Jaccard similarity over lower-cased whitespace tokens longer
/// than two characters. Used to fuzzy-match user-agent strings.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let tokens = |s: &str| -> std::collections::HashSet<String> {
        s.to_lowercase()
            .split_whitespace()
            .filter(|t| t.len() > 2)
            .map(|t| t.to_string())
            .collect()
    };

    let sa = tokens(a);
    let sb = tokens(b);
    if sa.is_empty() || sb.is_empty() {
        return 0.0;
    }

    let intersection = sa.intersection(&sb).count() as f64;
    let union = sa.union(&sb).count() as f64;
    intersection / union
}

/// Derive short machine-usable labels from reason strings: the first
/// whitespace-delimited token of each reason, lower-cased. Lossy, but risk
/// factors are advisory labels rather than identifiers.
pub fn risk_factors(reasons: &[String]) -> Vec<String> {
    reasons
        .iter()
        .filter_map(|r| r.split_whitespace().next())
        .map(|t| t.to_lowercase())
        .collect()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Score a live event against its baseline profile.
///
/// Typing, user-agent, time and IP degrade to the neutral 1.0 when either
/// side is absent; device and location are hard checks and score 0.0 when
/// the event lacks them. Callers must fold the event into the profile
/// afterwards, regardless of the outcome, so the baseline keeps adapting.
pub fn score_event(
    profile: &Profile,
    event: &LoginEvent,
    weights: &ScoreWeights,
    threshold: f64,
) -> SimilarityReport {
    let mut reasons = Vec::new();

    // Typing speed: deviation from the learned mean, normalized by the
    // spread when one is known, else by the mean itself.
    let mut typing_score = 1.0;
    if let (Some(avg), Some(value)) = (profile.avg_typing_speed, event.typing_speed) {
        let diff = (value - avg).abs();
        let denom = match profile.std_typing_speed {
            Some(std) if std > 0.0 => std,
            _ => avg.max(1.0),
        };
        typing_score = (1.0 - diff / denom).max(0.0);
        if typing_score < 0.6 {
            reasons.push(format!("Typing speed deviates (got {}, avg {})", value, avg));
        }
    }

    // Device fingerprint: exact membership in the observed set.
    let device_score = match &event.device_fingerprint {
        Some(fp) if !fp.is_empty() && profile.device_fingerprints.contains(fp) => 1.0,
        _ => 0.0,
    };
    if device_score == 0.0 {
        reasons.push("Device fingerprint mismatch".to_string());
    }

    // User agent: best token-Jaccard against every historical UA.
    let mut ua_score = 1.0;
    if let Some(agent) = &event.user_agent {
        if !agent.is_empty() && !profile.user_agents.is_empty() {
            let best = profile
                .user_agents
                .iter()
                .filter(|ua| !ua.is_empty())
                .map(|ua| jaccard(ua, agent))
                .fold(0.0, f64::max);
            ua_score = if best >= 0.45 { 1.0 } else { 0.0 };
            if ua_score == 0.0 {
                reasons.push("User-Agent mismatch".to_string());
            }
        }
    }

    // Location: exact membership.
    let location_score = match &event.location {
        Some(loc) if !loc.is_empty() && profile.locations.contains(loc) => 1.0,
        _ => 0.0,
    };
    if location_score == 0.0 {
        reasons.push(format!(
            "Unusual login location: {}",
            event.location.as_deref().unwrap_or_default()
        ));
    }

    // Time of day: membership in the typical-hour set. A timestamp long
    // enough to carry an hour field that still fails to parse contributes
    // exactly 0.5 with no reason.
    let mut time_score = 1.0;
    if let Some(ts) = &event.access_time {
        if ts.len() >= 13 && !profile.typical_hours.is_empty() {
            time_score = match extract_hour(ts) {
                Some(hour) => {
                    if profile.typical_hours.contains(&hour) {
                        1.0
                    } else {
                        reasons.push(format!("Unusual login hour: {}", hour));
                        0.0
                    }
                }
                None => 0.5,
            };
        }
    }

    // IP address: prefix match so stored subnet-style shorthand like
    // "10.0.0" covers the whole range.
    let mut ip_score = 1.0;
    if let Some(ip) = &event.ip_address {
        if !ip.is_empty() && !profile.ip_addresses.is_empty() {
            ip_score = if profile
                .ip_addresses
                .iter()
                .any(|stored| !stored.is_empty() && ip.starts_with(stored.as_str()))
            {
                1.0
            } else {
                0.0
            };
            if ip_score == 0.0 {
                reasons.push("IP address mismatch".to_string());
            }
        }
    }

    let similarity = weights.typing * typing_score
        + weights.device * device_score
        + weights.ua * ua_score
        + weights.location * location_score
        + weights.time * time_score
        + weights.ip * ip_score;

    let factors = risk_factors(&reasons);
    SimilarityReport {
        // The threshold sees the raw value; rounding is for reporting only.
        suspicious: similarity < threshold,
        similarity: round3(similarity),
        reasons,
        risk_factors: factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::profile::from_events;
    use std::collections::HashMap;

    fn baseline_event() -> LoginEvent {
        LoginEvent {
            site: "portal".into(),
            username: "alice".into(),
            device_fingerprint: Some("dev-1".into()),
            typing_speed: Some(120.0),
            location: Some("US".into()),
            access_time: Some("2025-01-01T09:00:00Z".into()),
            user_agent: Some("Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/120.0".into()),
            ip_address: Some("10.0.0.5".into()),
            additional: HashMap::new(),
        }
    }

    fn baseline_profile() -> Profile {
        from_events(&[baseline_event()])
    }

    #[test]
    fn perfect_match_scores_one() {
        let profile = baseline_profile();
        let report = score_event(
            &profile,
            &baseline_event(),
            &ScoreWeights::default(),
            0.6,
        );
        assert_eq!(report.similarity, 1.0);
        assert!(!report.suspicious);
        assert!(report.reasons.is_empty());
        assert!(report.risk_factors.is_empty());
    }

    #[test]
    fn total_mismatch_scores_zero_with_six_reasons() {
        let profile = baseline_profile();
        let event = LoginEvent {
            site: "portal".into(),
            username: "alice".into(),
            device_fingerprint: Some("dev-999".into()),
            typing_speed: Some(500.0),
            location: Some("RU".into()),
            access_time: Some("2025-01-01T03:00:00Z".into()),
            user_agent: Some("curl/8.0".into()),
            ip_address: Some("203.0.113.9".into()),
            additional: HashMap::new(),
        };
        let report = score_event(&profile, &event, &ScoreWeights::default(), 0.6);
        assert_eq!(report.similarity, 0.0);
        assert!(report.suspicious);
        assert_eq!(report.reasons.len(), 6);
        assert_eq!(report.risk_factors.len(), 6);
        assert_eq!(report.risk_factors[0], "typing");
    }

    #[test]
    fn absent_features_stay_neutral() {
        let profile = baseline_profile();
        let event = LoginEvent {
            site: "portal".into(),
            username: "alice".into(),
            device_fingerprint: Some("dev-1".into()),
            typing_speed: None,
            location: Some("US".into()),
            access_time: None,
            user_agent: None,
            ip_address: None,
            additional: HashMap::new(),
        };
        let report = score_event(&profile, &event, &ScoreWeights::default(), 0.6);
        assert_eq!(report.similarity, 1.0);
        assert!(!report.suspicious);
    }

    #[test]
    fn unparsable_hour_contributes_half_without_a_reason() {
        let profile = baseline_profile();
        let mut event = baseline_event();
        event.access_time = Some("2025-01-01TXX:00:00Z".into());
        let report = score_event(&profile, &event, &ScoreWeights::default(), 0.6);
        // All other features match: 0.9 + 0.10 * 0.5
        assert_eq!(report.similarity, 0.95);
        assert!(report.reasons.is_empty());
    }

    #[test]
    fn typing_deviation_normalized_by_std_when_present() {
        let events = vec![
            LoginEvent { typing_speed: Some(100.0), ..baseline_event() },
            LoginEvent { typing_speed: Some(140.0), ..baseline_event() },
        ];
        let profile = from_events(&events);
        // avg 120, population std 20; an event at 150 deviates by 1.5 std.
        let mut event = baseline_event();
        event.typing_speed = Some(150.0);
        let report = score_event(&profile, &event, &ScoreWeights::default(), 0.6);
        // typing score clamps to 0; every other feature matches.
        assert_eq!(report.similarity, 0.65);
        assert!(report.reasons.iter().any(|r| r.starts_with("Typing speed deviates")));
    }

    #[test]
    fn jaccard_is_symmetric() {
        let pairs = [
            ("Mozilla/5.0 (X11; Linux) Firefox/120.0", "Mozilla/5.0 (X11; Linux) Chrome/120.0"),
            ("curl/8.0", "Mozilla/5.0 Gecko Firefox"),
            ("", "Mozilla/5.0"),
            ("one two three", "three two one"),
        ];
        for (a, b) in pairs {
            assert_eq!(jaccard(a, b), jaccard(b, a));
        }
    }

    #[test]
    fn jaccard_ignores_short_tokens_and_case() {
        assert_eq!(jaccard("Mozilla/5.0 aa b", "mozilla/5.0 cc d"), 1.0);
        assert_eq!(jaccard("aa b", "aa b"), 0.0);
    }

    #[test]
    fn ip_prefix_matches_subnet_shorthand() {
        let mut profile = baseline_profile();
        profile.ip_addresses = vec!["10.0.0".into()];

        let mut event = baseline_event();
        event.ip_address = Some("10.0.0.5".into());
        let report = score_event(&profile, &event, &ScoreWeights::default(), 0.6);
        assert!(!report.reasons.iter().any(|r| r == "IP address mismatch"));

        profile.ip_addresses = vec!["10.0.1".into()];
        let report = score_event(&profile, &event, &ScoreWeights::default(), 0.6);
        assert!(report.reasons.iter().any(|r| r == "IP address mismatch"));
    }

    #[test]
    fn risk_factors_take_first_token_lowercased() {
        let reasons = vec![
            "Unusual login location: RU".to_string(),
            "Device fingerprint mismatch".to_string(),
        ];
        assert_eq!(risk_factors(&reasons), vec!["unusual", "device"]);
    }
}
