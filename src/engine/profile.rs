//! Baseline construction: batch aggregation over historical events and
//! incremental folding of single events into an existing profile.

use crate::models::{LoginEvent, Profile};

/// Extract the hour-of-day from an ISO-8601 timestamp (`...THH:MM...`).
///
/// Returns None when the string is too short to carry an hour field at the
/// expected offset or the field is not numeric. Callers treat None as
/// "skip", never as an error.
pub fn extract_hour(access_time: &str) -> Option<u32> {
    access_time.get(11..13)?.parse().ok()
}

/// Append a value to a set-semantics vector, preserving first-appearance
/// order. Empty values are ignored.
fn push_unique(values: &mut Vec<String>, candidate: Option<&String>) {
    if let Some(v) = candidate {
        if !v.is_empty() && !values.iter().any(|existing| existing == v) {
            values.push(v.clone());
        }
    }
}

/// Build a baseline profile from a batch of historical events.
pub fn from_events(events: &[LoginEvent]) -> Profile {
    let typing: Vec<f64> = events.iter().filter_map(|e| e.typing_speed).collect();

    let avg_typing_speed = if typing.is_empty() {
        None
    } else {
        Some(typing.iter().sum::<f64>() / typing.len() as f64)
    };

    // Population standard deviation; only meaningful with at least two
    // samples. Incremental folds never revisit this value.
    let std_typing_speed = match avg_typing_speed {
        Some(avg) if typing.len() > 1 => {
            let variance =
                typing.iter().map(|x| (x - avg) * (x - avg)).sum::<f64>() / typing.len() as f64;
            Some(variance.sqrt())
        }
        _ => None,
    };

    let mut profile = Profile {
        avg_typing_speed,
        std_typing_speed,
        device_fingerprints: Vec::new(),
        locations: Vec::new(),
        user_agents: Vec::new(),
        ip_addresses: Vec::new(),
        typical_hours: Vec::new(),
        samples: events.len() as u64,
    };

    for event in events {
        push_unique(&mut profile.device_fingerprints, event.device_fingerprint.as_ref());
        push_unique(&mut profile.locations, event.location.as_ref());
        push_unique(&mut profile.user_agents, event.user_agent.as_ref());
        push_unique(&mut profile.ip_addresses, event.ip_address.as_ref());

        if let Some(ts) = &event.access_time {
            if let Some(hour) = extract_hour(ts) {
                if !profile.typical_hours.contains(&hour) {
                    profile.typical_hours.push(hour);
                }
            }
        }
    }
    profile.typical_hours.sort_unstable();

    profile
}

/// Fold a single event into an existing profile, in place.
///
/// The first typing sample sets the mean outright; later samples update it
/// with `(avg * samples + v) / (samples + 1)`. The standard deviation is
/// never recomputed here. `samples` grows on every call, whether or not any
/// field changed.
pub fn fold(profile: &mut Profile, event: &LoginEvent) {
    let samples = profile.samples;

    if let Some(value) = event.typing_speed {
        match profile.avg_typing_speed {
            None => {
                profile.avg_typing_speed = Some(value);
                profile.std_typing_speed = None;
            }
            Some(avg) => {
                profile.avg_typing_speed =
                    Some((avg * samples as f64 + value) / (samples as f64 + 1.0));
            }
        }
    }

    push_unique(&mut profile.device_fingerprints, event.device_fingerprint.as_ref());
    push_unique(&mut profile.user_agents, event.user_agent.as_ref());
    push_unique(&mut profile.ip_addresses, event.ip_address.as_ref());
    push_unique(&mut profile.locations, event.location.as_ref());

    if let Some(ts) = &event.access_time {
        if let Some(hour) = extract_hour(ts) {
            if !profile.typical_hours.contains(&hour) {
                profile.typical_hours.push(hour);
                profile.typical_hours.sort_unstable();
            }
        }
    }

    profile.samples = samples + 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn event(typing: Option<f64>, access_time: Option<&str>) -> LoginEvent {
        LoginEvent {
            site: "portal".into(),
            username: "alice".into(),
            device_fingerprint: Some("dev-1".into()),
            typing_speed: typing,
            location: Some("US".into()),
            access_time: access_time.map(|s| s.to_string()),
            user_agent: Some("Mozilla/5.0 (X11; Linux x86_64) Firefox/120.0".into()),
            ip_address: Some("10.0.0.5".into()),
            additional: HashMap::new(),
        }
    }

    #[test]
    fn batch_build_aggregates_statistics() {
        let events = vec![
            event(Some(100.0), Some("2025-01-01T09:15:00Z")),
            event(Some(140.0), Some("2025-01-01T17:30:00Z")),
            event(Some(120.0), Some("2025-01-02T09:45:00Z")),
        ];
        let profile = from_events(&events);

        assert_eq!(profile.samples, 3);
        assert_eq!(profile.avg_typing_speed, Some(120.0));
        let std = profile.std_typing_speed.unwrap();
        assert!((std - (800.0f64 / 3.0).sqrt()).abs() < 1e-9);
        assert_eq!(profile.typical_hours, vec![9, 17]);
        assert_eq!(profile.device_fingerprints, vec!["dev-1"]);
    }

    #[test]
    fn single_typing_sample_leaves_std_unset() {
        let profile = from_events(&[event(Some(150.0), None)]);
        assert_eq!(profile.avg_typing_speed, Some(150.0));
        assert!(profile.std_typing_speed.is_none());
        assert!(profile.typical_hours.is_empty());
    }

    #[test]
    fn no_typing_samples_leaves_average_unset() {
        let profile = from_events(&[event(None, None), event(None, None)]);
        assert!(profile.avg_typing_speed.is_none());
        assert_eq!(profile.samples, 2);
    }

    #[test]
    fn incremental_mean_matches_batch_mean() {
        let speeds = [100.0, 140.0, 120.0, 180.0, 95.0];
        let events: Vec<LoginEvent> = speeds.iter().map(|&s| event(Some(s), None)).collect();

        let batch = from_events(&events);

        let mut incremental = from_events(&events[..1]);
        for e in &events[1..] {
            fold(&mut incremental, e);
        }

        assert_eq!(incremental.samples, batch.samples);
        let a = incremental.avg_typing_speed.unwrap();
        let b = batch.avg_typing_speed.unwrap();
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn fold_never_recomputes_std() {
        let mut profile = from_events(&[
            event(Some(100.0), None),
            event(Some(140.0), None),
        ]);
        let frozen = profile.std_typing_speed;
        assert!(frozen.is_some());

        fold(&mut profile, &event(Some(400.0), None));
        assert_eq!(profile.std_typing_speed, frozen);
        assert_eq!(profile.samples, 3);
    }

    #[test]
    fn fold_counts_samples_even_when_nothing_changes() {
        let mut profile = from_events(&[event(Some(100.0), Some("2025-01-01T09:00:00Z"))]);
        let before = profile.samples;
        fold(&mut profile, &event(None, None));
        assert_eq!(profile.samples, before + 1);
    }

    #[test]
    fn malformed_timestamps_are_skipped_not_errors() {
        let mut profile = from_events(&[event(Some(100.0), Some("10:00"))]);
        assert!(profile.typical_hours.is_empty());

        fold(&mut profile, &event(None, Some("not a timestamp!")));
        assert!(profile.typical_hours.is_empty());

        fold(&mut profile, &event(None, Some("2025-01-01T23:59:00Z")));
        assert_eq!(profile.typical_hours, vec![23]);
    }

    #[test]
    fn folded_hours_stay_sorted() {
        let mut profile = from_events(&[event(None, Some("2025-01-01T14:00:00Z"))]);
        fold(&mut profile, &event(None, Some("2025-01-01T03:00:00Z")));
        fold(&mut profile, &event(None, Some("2025-01-01T22:00:00Z")));
        assert_eq!(profile.typical_hours, vec![3, 14, 22]);
    }

    #[test]
    fn hour_extraction_edge_cases() {
        assert_eq!(extract_hour("2025-01-01T07:30:00Z"), Some(7));
        assert_eq!(extract_hour("2025-01-01T0"), None);
        assert_eq!(extract_hour("12:34"), None);
        assert_eq!(extract_hour("2025-01-01TXX:00:00Z"), None);
    }
}
