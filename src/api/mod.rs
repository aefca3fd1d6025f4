pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod websocket;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use log::info;

use crate::config::Config;
use crate::engine::{BaselineSimilarityDetector, SessionRuleDetector};
use crate::enrich::Forwarder;
use crate::store::{AlertLog, JsonFileStorage, ProfileStore, SessionStore};
use middleware::RequestLogger;

fn build_cors(origins: &[String]) -> Cors {
    let mut cors = Cors::default();
    for origin in origins {
        cors = cors.allowed_origin(origin);
    }
    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec!["Authorization", "Content-Type"])
        .max_age(3600)
}

/// Run the baseline-similarity reporter service.
pub async fn run_reporter(config: Config) -> std::io::Result<()> {
    let storage = Arc::new(JsonFileStorage::new(&config.profiles_path));
    let profiles = Arc::new(
        ProfileStore::open(storage)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?,
    );
    let detector = Arc::new(BaselineSimilarityDetector::new(profiles.clone(), &config));
    let forwarder = Arc::new(Forwarder::new(&config.backend_intake_url));

    let server_address = format!("{}:{}", config.reporter_host, config.reporter_port);
    let workers = config.workers;
    info!("Starting reporter service on {}", server_address);

    HttpServer::new(move || {
        let cors = build_cors(&config.cors_origins);

        App::new()
            .wrap(cors)
            .wrap(RequestLogger::new())
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(profiles.clone()))
            .app_data(web::Data::new(detector.clone()))
            .app_data(web::Data::new(forwarder.clone()))
            .configure(routes::reporter_routes)
    })
    .bind(server_address)?
    .workers(workers)
    .run()
    .await
}

/// Run the rule-based backend service.
pub async fn run_backend(config: Config) -> std::io::Result<()> {
    let sessions = Arc::new(SessionStore::new());
    let alerts = Arc::new(AlertLog::new());
    let detector = Arc::new(SessionRuleDetector::new(sessions.clone(), alerts.clone(), &config));

    let server_address = format!("{}:{}", config.backend_host, config.backend_port);
    let workers = config.workers;
    info!("Starting backend service on {}", server_address);

    HttpServer::new(move || {
        let cors = build_cors(&config.cors_origins);

        App::new()
            .wrap(cors)
            .wrap(RequestLogger::new())
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(sessions.clone()))
            .app_data(web::Data::new(alerts.clone()))
            .app_data(web::Data::new(detector.clone()))
            .configure(routes::backend_routes)
    })
    .bind(server_address)?
    .workers(workers)
    .run()
    .await
}
