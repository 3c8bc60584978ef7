//! One actor per websocket connection. The session stays dumb: it frames
//! messages, keeps the heartbeat, and hands everything else to the room
//! registry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{debug, info, warn};

use crate::protocol::{ClientMsg, ServerMsg};
use crate::state::app_state::AppState;
use crate::ws::hub::OutboundFrame;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(app_state.into_inner());
    ws::start(session, &req, stream)
}

pub struct WsSession {
    app_state: Arc<AppState>,
    /// Set by the first `join` message.
    user_id: Option<String>,
    last_heartbeat: Instant,
}

impl WsSession {
    fn new(app_state: Arc<AppState>) -> Self {
        Self {
            app_state,
            user_id: None,
            last_heartbeat: Instant::now(),
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "failed to serialize outbound message"),
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(user_id = ?actor.user_id, "client heartbeat timed out, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn handle_client_msg(&mut self, msg: ClientMsg, ctx: &mut ws::WebsocketContext<Self>) {
        // The first message must bind an identity; everything else routes
        // through the registry.
        if let ClientMsg::Join { user_id, name } = &msg {
            if user_id.is_empty() || name.trim().is_empty() {
                Self::send_json(
                    ctx,
                    &ServerMsg::Error {
                        code: "BAD_REQUEST".to_string(),
                        message: "join needs a user id and a name".to_string(),
                    },
                );
                return;
            }
            self.user_id = Some(user_id.clone());
            self.app_state
                .ws_registry()
                .register(user_id.clone(), ctx.address().recipient());
            info!(user_id = %user_id, "socket joined");

            let rooms = self.app_state.rooms();
            let user_id = user_id.clone();
            let name = name.clone();
            ctx.spawn(
                async move { rooms.register(&user_id, &name).await }
                    .into_actor(self)
                    .map(|res, _, ctx| {
                        if let Err(err) = res {
                            Self::send_json(ctx, &error_msg(&err));
                        }
                    }),
            );
            return;
        }

        let Some(user_id) = self.user_id.clone() else {
            Self::send_json(
                ctx,
                &ServerMsg::Error {
                    code: "BAD_REQUEST".to_string(),
                    message: "send join first".to_string(),
                },
            );
            return;
        };

        let rooms = self.app_state.rooms();
        ctx.spawn(
            async move { rooms.handle(&user_id, msg).await }
                .into_actor(self)
                .map(|res, _, ctx| {
                    if let Err(err) = res {
                        Self::send_json(ctx, &error_msg(&err));
                    }
                }),
        );
    }
}

fn error_msg(err: &crate::error::AppError) -> ServerMsg {
    ServerMsg::Error {
        code: err.code().to_string(),
        message: err.detail().to_string(),
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, ctx: &mut Self::Context) {
        if let Some(user_id) = self.user_id.take() {
            let recipient = ctx.address().recipient();
            self.app_state.ws_registry().unregister(&user_id, &recipient);
            let rooms = self.app_state.rooms();
            actix::spawn(async move {
                rooms.disconnect(&user_id).await;
            });
        }
    }
}

impl Handler<OutboundFrame> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: OutboundFrame, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();
                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(client_msg) => self.handle_client_msg(client_msg, ctx),
                    Err(err) => {
                        debug!(error = %err, "unparseable client message");
                        Self::send_json(
                            ctx,
                            &ServerMsg::Error {
                                code: "BAD_REQUEST".to_string(),
                                message: format!("unparseable message: {err}"),
                            },
                        );
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                Self::send_json(
                    ctx,
                    &ServerMsg::Error {
                        code: "BAD_REQUEST".to_string(),
                        message: "binary frames are not supported".to_string(),
                    },
                );
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "websocket protocol error");
                ctx.stop();
            }
        }
    }
}
