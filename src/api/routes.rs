use actix_web::web;

use super::handlers::{check, events, profiles};
use super::websocket;

/// Routes for the baseline-similarity reporter service.
pub fn reporter_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(check::root))
        .route("/health", web::get().to(check::health))
        .route("/check", web::post().to(check::check_event))
        .service(
            web::scope("/profiles")
                .route("", web::post().to(profiles::create_profile))
                .route("", web::get().to(profiles::list_profiles))
                .route("/{site}/{username}", web::get().to(profiles::get_profile))
                .route(
                    "/{site}/{username}/add_event",
                    web::post().to(profiles::add_profile_event),
                ),
        );
}

/// Routes for the rule-based backend service.
pub fn backend_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/login_event", web::post().to(events::login_event))
            .route("/lock_account", web::post().to(events::lock_account))
            .route("/unlock_account", web::post().to(events::unlock_account))
            .route("/re_authenticate", web::post().to(events::re_authenticate))
            .route("/sessions", web::get().to(events::get_sessions))
            .route("/alerts", web::get().to(events::get_alerts)),
    )
    .route("/ws/alerts", web::get().to(websocket::ws_alerts));
}
