//! Synthetic login traffic for demos and end-to-end exercising: a normal
//! population plus a stolen-credential attack pattern (fast typing, odd
//! location), with an ingest client that replays a batch against the
//! backend intake.

use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use uuid::Uuid;

use crate::models::{utc_timestamp, IntakeEvent};

const LOCATIONS: [&str; 6] = ["IN", "US", "UK", "RU", "CN", "BR"];
const ATTACK_LOCATIONS: [&str; 2] = ["RU", "CN"];
const USERS: [&str; 4] = ["alice", "bob", "carol", "eve"];

fn pick<'a>(rng: &mut impl Rng, values: &[&'a str]) -> &'a str {
    values[rng.gen_range(0..values.len())]
}

fn clock_time(rng: &mut impl Rng) -> String {
    format!("{:02}:{:02}", rng.gen_range(0..24), rng.gen_range(0..60))
}

/// One event from the normal population: typing speed drawn from
/// Normal(160, 40).
pub fn generate_event(rng: &mut impl Rng) -> IntakeEvent {
    let typing = Normal::new(160.0, 40.0).expect("valid distribution parameters");

    IntakeEvent {
        event_id: Uuid::new_v4().to_string(),
        timestamp: utc_timestamp(),
        username: pick(rng, &USERS).to_string(),
        device_fingerprint: format!("dev-{}", rng.gen_range(100..1000)),
        location: pick(rng, &LOCATIONS).to_string(),
        typing_speed: typing.sample(rng),
        access_time: clock_time(rng),
        additional: Default::default(),
    }
}

/// One stolen-credential attack event: implausibly fast typing from an
/// unusual location.
pub fn generate_attack(rng: &mut impl Rng) -> IntakeEvent {
    IntakeEvent {
        event_id: Uuid::new_v4().to_string(),
        timestamp: utc_timestamp(),
        username: pick(rng, &USERS).to_string(),
        device_fingerprint: format!("dev-{}", rng.gen_range(100..1000)),
        location: pick(rng, &ATTACK_LOCATIONS).to_string(),
        typing_speed: rng.gen_range(220.0..300.0),
        access_time: clock_time(rng),
        additional: Default::default(),
    }
}

/// Generate a mixed batch and write it as a JSON array.
pub fn write_batch(path: &str, normal: usize, attacks: usize) -> Result<()> {
    let mut rng = rand::thread_rng();
    let mut events: Vec<IntakeEvent> = (0..normal).map(|_| generate_event(&mut rng)).collect();
    events.extend((0..attacks).map(|_| generate_attack(&mut rng)));

    let data = serde_json::to_string_pretty(&events)?;
    fs::write(path, data).with_context(|| format!("Failed to write event batch to {}", path))?;

    info!("Wrote {} events ({} attacks) to {}", normal + attacks, attacks, path);
    Ok(())
}

/// Replay a batch file against the backend intake, printing the status of
/// each send and any alert that came back.
pub async fn ingest(path: &str, url: &str) -> Result<()> {
    let data =
        fs::read_to_string(path).with_context(|| format!("Failed to read event batch {}", path))?;
    let events: Vec<IntakeEvent> = serde_json::from_str(&data)?;

    let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;

    for event in events {
        match client.post(url).json(&event).send().await {
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                println!("Sent event {}: status {}", event.event_id, status);
                if status.is_success() && body.contains("alert_id") {
                    println!("  Alert: {}", body);
                }
            }
            Err(e) => {
                println!("Sent event {}: error {}", event.event_id, e);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_events_look_like_attacks() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let event = generate_attack(&mut rng);
            assert!(event.typing_speed >= 220.0 && event.typing_speed < 300.0);
            assert!(ATTACK_LOCATIONS.contains(&event.location.as_str()));
            assert!(USERS.contains(&event.username.as_str()));
        }
    }

    #[test]
    fn generated_events_are_well_formed() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            let event = generate_event(&mut rng);
            assert!(event.device_fingerprint.starts_with("dev-"));
            assert_eq!(event.access_time.len(), 5);
            let hour: u32 = event.access_time[..2].parse().unwrap();
            assert!(hour < 24);
            assert!(event.timestamp.ends_with('Z'));
        }
    }

    #[test]
    fn batches_round_trip_through_json() {
        let mut rng = rand::thread_rng();
        let events = vec![generate_event(&mut rng), generate_attack(&mut rng)];
        let data = serde_json::to_string(&events).unwrap();
        let parsed: Vec<IntakeEvent> = serde_json::from_str(&data).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].event_id, events[0].event_id);
    }
}
