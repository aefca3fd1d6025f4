mod handlers;

use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use std::sync::Arc;
use std::time::Duration;

use crate::store::AlertLog;
use handlers::AlertSession;

// How often heartbeat pings are sent
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

// How long before lack of client response causes a timeout
const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

// Alert feed connection handler
pub async fn ws_alerts(
    req: HttpRequest,
    stream: web::Payload,
    alerts: web::Data<Arc<AlertLog>>,
) -> Result<HttpResponse, Error> {
    let session = AlertSession::new(alerts.get_ref().clone());
    ws::start(session, &req, stream)
}
