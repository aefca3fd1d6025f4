//! Profile persistence: an in-memory map guarded by a store-wide lock, with
//! a pluggable snapshot backend. Every mutation persists before returning,
//! and the write lock is held across the whole read-modify-write so
//! same-key operations serialize.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::warn;
use parking_lot::RwLock;

use crate::engine::profile as builder;
use crate::error::SentinelError;
use crate::models::{LoginEvent, Profile, ProfileMap};

/// Snapshot persistence for the profile map. The JSON file backend below is
/// a full-snapshot overwrite, acceptable for a single-process deployment; a
/// transactional backend can replace it without touching scoring.
pub trait ProfileStorage: Send + Sync {
    fn load(&self) -> Result<ProfileMap, SentinelError>;
    fn save(&self, profiles: &ProfileMap) -> Result<(), SentinelError>;
}

/// JSON file snapshot, `{site: {username: profile}}`.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        JsonFileStorage { path: path.as_ref().to_path_buf() }
    }
}

impl ProfileStorage for JsonFileStorage {
    fn load(&self) -> Result<ProfileMap, SentinelError> {
        if !self.path.exists() {
            return Ok(ProfileMap::new());
        }
        let data = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&data) {
            Ok(profiles) => Ok(profiles),
            Err(e) => {
                // An unreadable snapshot means starting over with an empty
                // baseline set, not refusing to start.
                warn!("discarding unreadable profile snapshot {}: {}", self.path.display(), e);
                Ok(ProfileMap::new())
            }
        }
    }

    fn save(&self, profiles: &ProfileMap) -> Result<(), SentinelError> {
        let data = serde_json::to_string_pretty(profiles)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Thread-safe profile store. Loaded once at startup; saved after every
/// mutating operation.
pub struct ProfileStore {
    profiles: RwLock<ProfileMap>,
    storage: Arc<dyn ProfileStorage>,
}

impl ProfileStore {
    pub fn open(storage: Arc<dyn ProfileStorage>) -> Result<Self, SentinelError> {
        let profiles = storage.load()?;
        Ok(ProfileStore { profiles: RwLock::new(profiles), storage })
    }

    pub fn get(&self, site: &str, username: &str) -> Option<Profile> {
        self.profiles.read().get(site).and_then(|users| users.get(username)).cloned()
    }

    pub fn all(&self) -> ProfileMap {
        self.profiles.read().clone()
    }

    /// Create (or replace) a baseline from a batch of historical events.
    pub fn create_from_events(
        &self,
        site: &str,
        username: &str,
        events: &[LoginEvent],
    ) -> Result<Profile, SentinelError> {
        let mut profiles = self.profiles.write();
        let profile = builder::from_events(events);
        profiles
            .entry(site.to_string())
            .or_default()
            .insert(username.to_string(), profile.clone());
        self.storage.save(&profiles)?;
        Ok(profile)
    }

    /// Fold one event into the named baseline, creating a single-event
    /// baseline when none exists yet.
    pub fn record_event(
        &self,
        site: &str,
        username: &str,
        event: &LoginEvent,
    ) -> Result<Profile, SentinelError> {
        let mut profiles = self.profiles.write();
        let users = profiles.entry(site.to_string()).or_default();
        let profile = match users.get_mut(username) {
            Some(profile) => {
                builder::fold(profile, event);
                profile.clone()
            }
            None => {
                let profile = builder::from_events(std::slice::from_ref(event));
                users.insert(username.to_string(), profile.clone());
                profile
            }
        };
        self.storage.save(&profiles)?;
        Ok(profile)
    }
}
