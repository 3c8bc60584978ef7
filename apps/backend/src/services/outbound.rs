//! Outbound push seam. Services talk to clients only through this trait;
//! the ws hub implements it and tests substitute a recorder.

use crate::protocol::ServerMsg;

/// Fire-and-forget push to a connected player. Sends to offline players
/// are dropped silently; the room state resync on reconnect covers them.
pub trait Outbound: Send + Sync {
    fn send(&self, player_id: &str, msg: &ServerMsg);
}

/// Records every push for assertions.
#[cfg(test)]
pub struct RecordingOutbound {
    pub sent: parking_lot::Mutex<Vec<(String, ServerMsg)>>,
}

#[cfg(test)]
impl RecordingOutbound {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            sent: parking_lot::Mutex::new(Vec::new()),
        })
    }

    /// Messages delivered to one player, in order.
    pub fn to(&self, player_id: &str) -> Vec<ServerMsg> {
        self.sent
            .lock()
            .iter()
            .filter(|(id, _)| id == player_id)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[cfg(test)]
impl Outbound for RecordingOutbound {
    fn send(&self, player_id: &str, msg: &ServerMsg) {
        self.sent.lock().push((player_id.to_string(), msg.clone()));
    }
}
