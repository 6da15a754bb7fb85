// ishop/src/web/ws.rs

//! `GET /ws?token=<jwt>`: live order notifications.
//!
//! Admin sessions join the admin room on connect. Any session may send
//! `{"event":"subscribeNotifications","userId":"<uuid>"}` to follow a user's
//! room; non-admins are limited to their own.

use crate::errors::AppError;
use crate::models::Role;
use crate::services::{auth_service, NotificationHub, Subscription, Topic};
use crate::state::AppState;
use actix::{fut, Actor, ActorContext, AsyncContext, Handler, Message, StreamHandler};
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

#[derive(Message)]
#[rtype(result = "()")]
struct HubFrame(String);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientFrame {
  event: String,
  #[serde(default)]
  user_id: Option<Uuid>,
}

pub struct NotificationSession {
  user_id: Uuid,
  role: Role,
  hub: NotificationHub,
  joined: HashSet<Topic>,
}

impl NotificationSession {
  pub fn new(user_id: Uuid, role: Role, hub: NotificationHub) -> Self {
    Self {
      user_id,
      role,
      hub,
      joined: HashSet::new(),
    }
  }

  /// Forwards everything published on `topic` into this session. The pump
  /// lives in the actor context, so it and its `Subscription` end with the session.
  fn join(&mut self, topic: Topic, ctx: &mut ws::WebsocketContext<Self>) {
    if !self.joined.insert(topic) {
      return;
    }
    let mut subscription: Subscription = self.hub.subscribe(topic);
    let addr = ctx.address();
    ctx.spawn(fut::wrap_future::<_, Self>(async move {
      while let Some(frame) = subscription.recv().await {
        addr.do_send(HubFrame(frame));
      }
    }));
    debug!(user_id = %self.user_id, ?topic, "Session joined topic.");
  }

  fn handle_client_text(&mut self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
    let frame: ClientFrame = match serde_json::from_str(text) {
      Ok(frame) => frame,
      Err(_) => {
        debug!("Ignoring unparseable client frame.");
        return;
      }
    };
    if frame.event != "subscribeNotifications" {
      return;
    }
    let target = frame.user_id.unwrap_or(self.user_id);
    if self.role != Role::Admin && target != self.user_id {
      warn!(user_id = %self.user_id, %target, "Refused subscription to another user's notifications.");
      return;
    }
    self.join(Topic::User(target), ctx);
  }
}

impl Actor for NotificationSession {
  type Context = ws::WebsocketContext<Self>;

  fn started(&mut self, ctx: &mut Self::Context) {
    if self.role == Role::Admin {
      self.join(Topic::Admin, ctx);
    }
    info!(user_id = %self.user_id, "Notification session opened.");
  }

  fn stopped(&mut self, _: &mut Self::Context) {
    info!(user_id = %self.user_id, "Notification session closed.");
  }
}

impl Handler<HubFrame> for NotificationSession {
  type Result = ();

  fn handle(&mut self, msg: HubFrame, ctx: &mut Self::Context) -> Self::Result {
    ctx.text(msg.0);
  }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for NotificationSession {
  fn handle(&mut self, item: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
    match item {
      Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
      Ok(ws::Message::Text(text)) => self.handle_client_text(&text, ctx),
      Ok(ws::Message::Close(reason)) => {
        ctx.close(reason);
        ctx.stop();
      }
      Ok(_) => {}
      Err(e) => {
        warn!(error = %e, "WebSocket protocol error.");
        ctx.stop();
      }
    }
  }
}

#[derive(Deserialize)]
pub struct WsQuery {
  #[serde(default)]
  token: String,
}

#[instrument(name = "handler::notifications_ws", skip_all)]
pub async fn notifications_ws(
  req: HttpRequest,
  stream: web::Payload,
  query: web::Query<WsQuery>,
  app_state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
  if query.token.is_empty() {
    return Err(AppError::Auth("Missing token".to_string()).into());
  }
  let claims = auth_service::decode_token(&query.token, &app_state.config.jwt_secret)?;
  ws::start(
    NotificationSession::new(claims.sub, claims.role, app_state.hub.clone()),
    &req,
    stream,
  )
}
