use actix_web::{web, HttpResponse};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::engine::{BaselineSimilarityDetector, Detector};
use crate::enrich::{forward, Forwarder};
use crate::error::SentinelError;
use crate::models::{CheckResult, LoginEvent};

pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "reporter running" }))
}

/// Score a login event against its baseline. Suspicious events are
/// forwarded to the backend intake in the background; the response never
/// waits on delivery. The event is folded into the baseline either way.
pub async fn check_event(
    event: web::Json<LoginEvent>,
    detector: web::Data<Arc<BaselineSimilarityDetector>>,
    forwarder: web::Data<Arc<Forwarder>>,
) -> Result<HttpResponse, SentinelError> {
    let event = event.into_inner();
    let assessment = detector.assess(&event).await?;

    let forwarded = assessment.suspicious;
    if forwarded {
        let report = forward::build_report(
            &event,
            assessment.score,
            &assessment.reasons,
            &assessment.risk_factors,
        );
        forwarder.spawn_forward(report);
    }

    Ok(HttpResponse::Ok().json(CheckResult {
        suspicious: assessment.suspicious,
        similarity: assessment.score,
        reasons: assessment.reasons,
        forwarded,
    }))
}

/// Liveness plus a best-effort probe of the backend; the probe result is
/// reported, never an error.
pub async fn health(config: web::Data<Config>) -> HttpResponse {
    let backend: String = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(client) => match client.get(&config.backend_alerts_url).send().await {
            Ok(response) => response.status().as_u16().to_string(),
            Err(e) => e.to_string(),
        },
        Err(e) => e.to_string(),
    };

    HttpResponse::Ok().json(json!({ "status": "ok", "backend": backend }))
}
