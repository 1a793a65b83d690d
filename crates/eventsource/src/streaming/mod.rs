mod event_stream;

pub use crate::streaming::event_stream::{EventStream, StreamItem};
