use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::engine::{Detector, SessionRuleDetector};
use crate::error::SentinelError;
use crate::models::IntakeEvent;
use crate::store::{AlertLog, SessionStore};

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

/// Score an incoming login event against the user's session state. Locked
/// accounts are rejected before any scoring happens. Returns the alert when
/// one fired, a plain acknowledgement otherwise.
pub async fn login_event(
    event: web::Json<IntakeEvent>,
    detector: web::Data<Arc<SessionRuleDetector>>,
) -> Result<HttpResponse, SentinelError> {
    let assessment = detector.assess(&event.to_login_event()).await?;

    match assessment.alert {
        Some(alert) => Ok(HttpResponse::Ok().json(alert)),
        None => Ok(HttpResponse::Ok().json(json!({ "result": "ok" }))),
    }
}

/// Administrative lock, bypassing the scoring path entirely.
pub async fn lock_account(
    query: web::Query<UsernameQuery>,
    sessions: web::Data<Arc<SessionStore>>,
) -> HttpResponse {
    sessions.lock(&query.username);
    HttpResponse::Ok().json(json!({ "result": "Account locked" }))
}

/// Administrative unlock; the only way out of the locked state.
pub async fn unlock_account(
    query: web::Query<UsernameQuery>,
    sessions: web::Data<Arc<SessionStore>>,
) -> Result<HttpResponse, SentinelError> {
    sessions.unlock(&query.username)?;
    Ok(HttpResponse::Ok().json(json!({ "result": "Account unlocked" })))
}

/// Advisory only: a real deployment would send an OTP or redirect here.
pub async fn re_authenticate(query: web::Query<UsernameQuery>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "result": "Re-authentication required",
        "username": query.username,
    }))
}

pub async fn get_sessions(sessions: web::Data<Arc<SessionStore>>) -> HttpResponse {
    HttpResponse::Ok().json(sessions.snapshot())
}

pub async fn get_alerts(alerts: web::Data<Arc<AlertLog>>) -> HttpResponse {
    HttpResponse::Ok().json(alerts.snapshot())
}
