use crate::event::{EventHandler, MessageEvent, DEFAULT_EVENT_TYPE};
use std::mem;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;

/// Cloneable read handle on the committed last-event-id, for a reconnect path
/// to consult from another thread while parsing continues.
#[derive(Debug, Clone)]
pub struct LastEventId {
    inner: Arc<RwLock<String>>,
}

impl LastEventId {
    pub fn get(&self) -> String {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// State machine over complete SSE lines. Feed it the output of
/// [`Utf8LineDecoder`](crate::Utf8LineDecoder); message events and comments go
/// to the handler, `retry` and `id` fields update internal state.
///
/// The handler is held weakly: once its owner drops it, dispatch becomes a
/// silent no-op.
#[derive(Debug)]
pub struct EventParser {
    handler: Weak<dyn EventHandler + Send + Sync>,
    data: String,
    event_type: String,
    pending_id: Option<String>,
    last_event_id: Arc<RwLock<String>>,
    retry: Duration,
}

impl EventParser {
    /// `initial_last_event_id` resumes a prior session (empty for a fresh
    /// one); `initial_retry` is the default reconnection delay before any
    /// `retry` field arrives.
    pub fn new(
        handler: Weak<dyn EventHandler + Send + Sync>,
        initial_last_event_id: impl Into<String>,
        initial_retry: Duration,
    ) -> Self {
        Self {
            handler,
            data: String::new(),
            event_type: String::new(),
            pending_id: None,
            last_event_id: Arc::new(RwLock::new(initial_last_event_id.into())),
            retry: initial_retry,
        }
    }

    /// Processes one complete line, without its terminator.
    pub fn parse(&mut self, line: &str) {
        match line.split_once(':') {
            None if line.is_empty() => self.dispatch_event(),
            None => self.process_field(line, ""),
            Some(("", comment)) => {
                let comment = comment.strip_prefix(' ').unwrap_or(comment);
                if let Some(handler) = self.handler.upgrade() {
                    handler.on_comment(comment);
                }
            }
            Some((field, value)) => {
                self.process_field(field, value.strip_prefix(' ').unwrap_or(value));
            }
        }
    }

    /// The committed last-event-id, as sent in a `Last-Event-ID` header on
    /// reconnect. `id` fields only take effect here once their event is
    /// dispatched.
    pub fn last_event_id(&self) -> String {
        self.last_event_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_event_id_handle(&self) -> LastEventId {
        LastEventId {
            inner: Arc::clone(&self.last_event_id),
        }
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry
    }

    /// Discards the event under construction and any staged id, keeping the
    /// committed last-event-id and the retry interval. Returns the interval so
    /// the caller can schedule the next reconnection.
    pub fn reset(&mut self) -> Duration {
        self.data.clear();
        self.event_type.clear();
        self.pending_id = None;
        self.retry
    }

    fn process_field(&mut self, field: &str, value: &str) {
        match field {
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            // Per https://github.com/whatwg/html/issues/689, an id containing
            // a null code point must never become the last event id.
            "id" => {
                if !value.contains('\0') {
                    self.pending_id = Some(value.to_string());
                }
            }
            "event" => {
                self.event_type.clear();
                self.event_type.push_str(value);
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(ms) = value.parse::<u64>() {
                        self.retry = Duration::from_millis(ms);
                    }
                }
            }
            _ => {}
        }
    }

    fn dispatch_event(&mut self) {
        if let Some(id) = self.pending_id.take() {
            *self
                .last_event_id
                .write()
                .unwrap_or_else(PoisonError::into_inner) = id;
        }
        if self.data.is_empty() {
            self.event_type.clear();
            return;
        }
        // The buffer always ends with the LF appended by its last data field.
        self.data.pop();
        let event = MessageEvent {
            data: mem::take(&mut self.data),
            last_event_id: self.last_event_id(),
        };
        let event_type = mem::take(&mut self.event_type);
        let event_type = if event_type.is_empty() {
            DEFAULT_EVENT_TYPE
        } else {
            &event_type
        };
        if let Some(handler) = self.handler.upgrade() {
            handler.on_message(event_type, event);
        }
    }
}
