use serde::{Deserialize, Serialize};

/// Event type used when a message had no `event` field.
pub const DEFAULT_EVENT_TYPE: &str = "message";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub data: String,
    pub last_event_id: String,
}

/// Receives parser output. Implementors must tolerate being called from
/// whichever thread feeds the parser.
pub trait EventHandler {
    fn on_message(&self, event_type: &str, event: MessageEvent);
    fn on_comment(&self, comment: &str);
}
