//! Optional best-effort geo-IP enrichment. Disabled by default; when
//! enabled it can only ever add a reason string — it never changes feature
//! scores, and every failure path (timeout, bad status, bad payload) yields
//! nothing at all.

use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::error::SentinelError;
use crate::models::Profile;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_BASE_URL: &str = "http://ip-api.com/json";

#[derive(Debug, Deserialize)]
struct GeoIpResponse {
    status: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(default, rename = "regionName")]
    region_name: Option<String>,
}

pub struct GeoIpClient {
    client: reqwest::Client,
    base_url: String,
}

impl GeoIpClient {
    pub fn new() -> Self {
        GeoIpClient::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .unwrap_or_default();
        GeoIpClient { client, base_url: base_url.to_string() }
    }

    /// Resolve the event IP and compare the resolved country/region against
    /// the profile's known locations. Returns a reason string on mismatch,
    /// None in every other case including lookup failure.
    pub async fn check(&self, ip_address: &str, profile: &Profile) -> Option<String> {
        if ip_address.is_empty() {
            return None;
        }
        match self.lookup(ip_address).await {
            Ok(Some((country, region))) => {
                if location_matches(&profile.locations, &country, &region) {
                    None
                } else {
                    Some(format!("Geo-IP location {}/{} unusual", country, region))
                }
            }
            Ok(None) => None,
            Err(e) => {
                debug!("geo-ip lookup for {} failed: {}", ip_address, e);
                None
            }
        }
    }

    async fn lookup(&self, ip_address: &str) -> Result<Option<(String, String)>, SentinelError> {
        let url = format!("{}/{}?fields=status,country,regionName", self.base_url, ip_address);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let body: GeoIpResponse = response.json().await?;
        if body.status != "success" {
            return Ok(None);
        }
        Ok(Some((
            body.country.unwrap_or_default(),
            body.region_name.unwrap_or_default(),
        )))
    }
}

impl Default for GeoIpClient {
    fn default() -> Self {
        GeoIpClient::new()
    }
}

/// Substring comparison in both directions, so "California" matches a
/// stored "San Jose, California" and vice versa.
fn location_matches(known: &[String], country: &str, region: &str) -> bool {
    known.iter().any(|loc| {
        if loc.is_empty() {
            return false;
        }
        (!country.is_empty() && loc.contains(country))
            || (!region.is_empty() && loc.contains(region))
            || (!country.is_empty() && country.contains(loc.as_str()))
            || (!region.is_empty() && region.contains(loc.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_on_substring_in_either_direction() {
        let known = vec!["San Jose, California".to_string()];
        assert!(location_matches(&known, "United States", "California"));
        let known = vec!["California".to_string()];
        assert!(location_matches(&known, "", "Southern California"));
    }

    #[test]
    fn no_match_for_unknown_region() {
        let known = vec!["US".to_string(), "UK".to_string()];
        assert!(!location_matches(&known, "Germany", "Bavaria"));
    }

    #[test]
    fn empty_fields_never_match() {
        assert!(!location_matches(&[String::new()], "Germany", "Bavaria"));
        assert!(!location_matches(&["US".to_string()], "", ""));
    }
}
