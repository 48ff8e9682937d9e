//! WebSocket connection handles

use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::ServerMessage;

/// Handle for sending messages to a specific WebSocket connection
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    /// Channel for sending messages to this connection
    pub sender: mpsc::UnboundedSender<ServerMessage>,

    /// Session the socket was opened for
    pub session_id: Uuid,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::UnboundedSender<ServerMessage>, session_id: Uuid) -> Self {
        Self { sender, session_id }
    }

    /// Send a message to this connection
    #[allow(clippy::result_large_err)]
    pub fn send(&self, msg: ServerMessage) -> Result<(), mpsc::error::SendError<ServerMessage>> {
        self.sender.send(msg)
    }
}
