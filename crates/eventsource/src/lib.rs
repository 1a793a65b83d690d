mod error;
mod event;
mod event_parser;
mod line_decoder;
pub mod streaming;

pub use crate::error::Error;
pub use crate::event::{EventHandler, MessageEvent, DEFAULT_EVENT_TYPE};
pub use crate::event_parser::{EventParser, LastEventId};
pub use crate::line_decoder::Utf8LineDecoder;
