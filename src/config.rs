use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Weights applied to the similarity scorer's per-feature scores. The table
/// sums to 1.0 so the weighted similarity stays in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub typing: f64,
    pub device: f64,
    pub location: f64,
    pub time: f64,
    pub ua: f64,
    pub ip: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            typing: 0.35,
            device: 0.25,
            location: 0.15,
            time: 0.10,
            ua: 0.10,
            ip: 0.05,
        }
    }
}

/// Service configuration. Defaults are overridden by an optional key=value
/// file (`CONFIG_FILE`, falling back to `sentinel.conf` when present), then
/// by environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub reporter_host: String,
    pub reporter_port: u16,
    pub backend_host: String,
    pub backend_port: u16,
    pub cors_origins: Vec<String>,
    pub backend_intake_url: String,
    pub backend_alerts_url: String,
    /// Similarity below this is suspicious.
    pub similarity_threshold: f64,
    /// Rule score at or above this fires an alert.
    pub rule_threshold: f64,
    /// Rule score above this escalates to high severity / lock.
    pub severity_threshold: f64,
    pub geoip_enabled: bool,
    pub allowed_locations: Vec<String>,
    pub weights: ScoreWeights,
    pub profiles_path: String,
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reporter_host: "0.0.0.0".to_string(),
            reporter_port: 8100,
            backend_host: "0.0.0.0".to_string(),
            backend_port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8000".to_string(),
            ],
            backend_intake_url: "http://localhost:8000/api/login_event".to_string(),
            backend_alerts_url: "http://localhost:8000/api/alerts".to_string(),
            similarity_threshold: 0.6,
            rule_threshold: 0.5,
            severity_threshold: 0.8,
            geoip_enabled: false,
            allowed_locations: vec!["IN".to_string(), "US".to_string(), "UK".to_string()],
            weights: ScoreWeights::default(),
            profiles_path: "profiles.json".to_string(),
            workers: 4,
        }
    }
}

/// Load configuration: defaults, then file, then environment.
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let file_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "sentinel.conf".to_string());
    let path = Path::new(&file_path);
    if path.exists() {
        load_from_file(&mut config, path)?;
    }

    load_from_env(&mut config);

    Ok(config)
}

fn apply(config: &mut Config, key: &str, value: &str) {
    match key {
        "REPORTER_HOST" => config.reporter_host = value.to_string(),
        "REPORTER_PORT" => {
            if let Ok(port) = value.parse() {
                config.reporter_port = port;
            }
        }
        "BACKEND_HOST" => config.backend_host = value.to_string(),
        "BACKEND_PORT" => {
            if let Ok(port) = value.parse() {
                config.backend_port = port;
            }
        }
        "CORS_ORIGINS" => {
            config.cors_origins = value.split(',').map(|s| s.trim().to_string()).collect();
        }
        "BACKEND_INTAKE_URL" => config.backend_intake_url = value.to_string(),
        "BACKEND_ALERTS_URL" => config.backend_alerts_url = value.to_string(),
        "SIMILARITY_THRESHOLD" => {
            if let Ok(v) = value.parse() {
                config.similarity_threshold = v;
            }
        }
        "RULE_THRESHOLD" => {
            if let Ok(v) = value.parse() {
                config.rule_threshold = v;
            }
        }
        "SEVERITY_THRESHOLD" => {
            if let Ok(v) = value.parse() {
                config.severity_threshold = v;
            }
        }
        "GEOIP_ENABLED" => {
            config.geoip_enabled = matches!(value.to_lowercase().as_str(), "1" | "true" | "yes");
        }
        "ALLOWED_LOCATIONS" => {
            config.allowed_locations = value.split(',').map(|s| s.trim().to_string()).collect();
        }
        "PROFILES_PATH" => config.profiles_path = value.to_string(),
        "API_WORKERS" => {
            if let Ok(workers) = value.parse() {
                config.workers = workers;
            }
        }
        "WEIGHT_TYPING" => {
            if let Ok(v) = value.parse() {
                config.weights.typing = v;
            }
        }
        "WEIGHT_DEVICE" => {
            if let Ok(v) = value.parse() {
                config.weights.device = v;
            }
        }
        "WEIGHT_LOCATION" => {
            if let Ok(v) = value.parse() {
                config.weights.location = v;
            }
        }
        "WEIGHT_TIME" => {
            if let Ok(v) = value.parse() {
                config.weights.time = v;
            }
        }
        "WEIGHT_UA" => {
            if let Ok(v) = value.parse() {
                config.weights.ua = v;
            }
        }
        "WEIGHT_IP" => {
            if let Ok(v) = value.parse() {
                config.weights.ip = v;
            }
        }
        _ => {}
    }
}

/// Pull overrides from the environment.
fn load_from_env(config: &mut Config) {
    const KEYS: [&str; 20] = [
        "REPORTER_HOST",
        "REPORTER_PORT",
        "BACKEND_HOST",
        "BACKEND_PORT",
        "CORS_ORIGINS",
        "BACKEND_INTAKE_URL",
        "BACKEND_ALERTS_URL",
        "SIMILARITY_THRESHOLD",
        "RULE_THRESHOLD",
        "SEVERITY_THRESHOLD",
        "GEOIP_ENABLED",
        "ALLOWED_LOCATIONS",
        "PROFILES_PATH",
        "API_WORKERS",
        "WEIGHT_TYPING",
        "WEIGHT_DEVICE",
        "WEIGHT_LOCATION",
        "WEIGHT_TIME",
        "WEIGHT_UA",
        "WEIGHT_IP",
    ];

    for key in KEYS {
        if let Ok(value) = env::var(key) {
            apply(config, key, &value);
        }
    }
}

/// Load configuration from a key=value file.
fn load_from_file(config: &mut Config, path: &Path) -> Result<()> {
    let file = File::open(path).context("Failed to open configuration file")?;
    let reader = BufReader::new(file);

    for line in reader.lines() {
        let line = line.context("Failed to read line from configuration file")?;
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(index) = line.find('=') {
            let key = line[..index].trim();
            let value = line[index + 1..].trim();
            apply(config, key, value);
        }
    }

    Ok(())
}
