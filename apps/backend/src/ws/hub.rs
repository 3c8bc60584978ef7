//! Socket registry: maps player ids to live session actors and carries the
//! services' outbound pushes onto them.

use actix::prelude::*;
use dashmap::DashMap;
use tracing::warn;

use crate::domain::state::PlayerId;
use crate::protocol::ServerMsg;
use crate::services::outbound::Outbound;

/// A pre-serialized frame headed for one socket.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct OutboundFrame(pub String);

/// One entry per connected player. A reconnect replaces the previous
/// session's recipient.
#[derive(Default)]
pub struct WsRegistry {
    sessions: DashMap<PlayerId, Recipient<OutboundFrame>>,
}

impl WsRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn register(&self, player_id: PlayerId, recipient: Recipient<OutboundFrame>) {
        self.sessions.insert(player_id, recipient);
    }

    /// Remove the entry only if it still points at this session; a newer
    /// connection may have replaced it already.
    pub fn unregister(&self, player_id: &str, recipient: &Recipient<OutboundFrame>) {
        self.sessions
            .remove_if(player_id, |_, current| current == recipient);
    }
}

impl Outbound for WsRegistry {
    fn send(&self, player_id: &str, msg: &ServerMsg) {
        let Some(recipient) = self.sessions.get(player_id) else {
            return;
        };
        match serde_json::to_string(msg) {
            Ok(payload) => recipient.do_send(OutboundFrame(payload)),
            Err(err) => warn!(error = %err, "failed to serialize outbound message"),
        }
    }
}
