use actix_web::{web, HttpResponse};
use serde_json::json;
use std::sync::Arc;

use crate::error::SentinelError;
use crate::models::{LoginEvent, ProfileCreate};
use crate::store::ProfileStore;

/// Create (or replace) a baseline profile from a batch of historical events.
pub async fn create_profile(
    payload: web::Json<ProfileCreate>,
    profiles: web::Data<Arc<ProfileStore>>,
) -> Result<HttpResponse, SentinelError> {
    let payload = payload.into_inner();
    let profile = profiles.create_from_events(&payload.site, &payload.username, &payload.events)?;

    Ok(HttpResponse::Ok().json(json!({
        "created": true,
        "site": payload.site,
        "username": payload.username,
        "profile": profile,
    })))
}

/// Fold a single event into an existing baseline, creating one when absent.
pub async fn add_profile_event(
    path: web::Path<(String, String)>,
    event: web::Json<LoginEvent>,
    profiles: web::Data<Arc<ProfileStore>>,
) -> Result<HttpResponse, SentinelError> {
    let (site, username) = path.into_inner();
    let profile = profiles.record_event(&site, &username, &event.into_inner())?;

    Ok(HttpResponse::Ok().json(json!({
        "updated": true,
        "site": site,
        "username": username,
        "profile": profile,
    })))
}

pub async fn list_profiles(profiles: web::Data<Arc<ProfileStore>>) -> HttpResponse {
    HttpResponse::Ok().json(profiles.all())
}

pub async fn get_profile(
    path: web::Path<(String, String)>,
    profiles: web::Data<Arc<ProfileStore>>,
) -> Result<HttpResponse, SentinelError> {
    let (site, username) = path.into_inner();
    let profile = profiles
        .get(&site, &username)
        .ok_or(SentinelError::ProfileNotFound { site, username })?;

    Ok(HttpResponse::Ok().json(profile))
}
