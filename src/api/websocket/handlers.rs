use actix::{Actor, ActorContext, AsyncContext, StreamHandler};
use actix_web_actors::ws;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::{CLIENT_TIMEOUT, HEARTBEAT_INTERVAL};
use crate::store::AlertLog;

/// One alert-feed connection. The feed has poll-on-receive semantics: the
/// full current alert list goes out on connect and again whenever the
/// client sends any message.
pub struct AlertSession {
    pub id: Uuid,
    pub heartbeat: Instant,
    pub alerts: Arc<AlertLog>,
}

impl AlertSession {
    pub fn new(alerts: Arc<AlertLog>) -> Self {
        AlertSession {
            id: Uuid::new_v4(),
            heartbeat: Instant::now(),
            alerts,
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.heartbeat) > CLIENT_TIMEOUT {
                info!("Alert feed client timed out: {}", act.id);
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn send_alerts(&self, ctx: &mut ws::WebsocketContext<Self>) {
        for alert in self.alerts.snapshot() {
            match serde_json::to_string(&alert) {
                Ok(json) => ctx.text(json),
                Err(e) => warn!("failed to serialize alert {}: {}", alert.alert_id, e),
            }
        }
    }
}

impl Actor for AlertSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.start_heartbeat(ctx);
        info!("Alert feed connection established: {}", self.id);
        self.send_alerts(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!("Alert feed connection closed: {}", self.id);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for AlertSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.heartbeat = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                // Any client message re-sends the current list.
                debug!("Alert feed poll from {}: {}", self.id, text);
                self.heartbeat = Instant::now();
                self.send_alerts(ctx);
            }
            Ok(ws::Message::Binary(bin)) => {
                warn!("Unexpected binary message on alert feed: {} bytes", bin.len());
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Alert feed protocol error on {}: {}", self.id, e);
                ctx.stop();
            }
        }
    }
}
