use crate::error::Error;
use crate::event::{EventHandler, MessageEvent};
use crate::event_parser::{EventParser, LastEventId};
use crate::line_decoder::Utf8LineDecoder;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamItem {
    Message {
        event_type: String,
        event: MessageEvent,
    },
    Comment(String),
}

#[derive(Default)]
struct ItemQueue {
    items: Mutex<VecDeque<StreamItem>>,
}

impl ItemQueue {
    fn pop(&self) -> Option<StreamItem> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn push(&self, item: StreamItem) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(item);
    }
}

impl EventHandler for ItemQueue {
    fn on_message(&self, event_type: &str, event: MessageEvent) {
        self.push(StreamItem::Message {
            event_type: event_type.to_string(),
            event,
        });
    }

    fn on_comment(&self, comment: &str) {
        self.push(StreamItem::Comment(comment.to_string()));
    }
}

/// Async composition of [`Utf8LineDecoder`](crate::Utf8LineDecoder) and
/// [`EventParser`]: wraps a stream of byte chunks and yields parsed events and
/// comments. An unterminated final line at end of stream is discarded, never
/// flushed.
pub struct EventStream {
    inner: Pin<Box<dyn Stream<Item = Result<StreamItem, Error>> + Send>>,
    cancel: CancellationToken,
    last_event_id: LastEventId,
}

impl EventStream {
    pub fn new<S, E>(
        byte_stream: S,
        initial_last_event_id: impl Into<String>,
        initial_retry: Duration,
    ) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
    {
        let queue = Arc::new(ItemQueue::default());
        let handler = Arc::downgrade(&queue);
        let handler: Weak<dyn EventHandler + Send + Sync> = handler;
        let parser = EventParser::new(handler, initial_last_event_id, initial_retry);
        let last_event_id = parser.last_event_id_handle();

        let cancel = CancellationToken::new();
        let cancel_for_stream = cancel.clone();
        let bytes_stream: BoxStream<'static, Result<Bytes, E>> = Box::pin(byte_stream);

        let stream = futures_util::stream::unfold(
            (
                bytes_stream,
                Utf8LineDecoder::new(),
                parser,
                queue,
                false,
                cancel_for_stream,
            ),
            move |(mut bytes_stream, mut decoder, mut parser, queue, mut done, cancel)| async move {
                if done {
                    return None;
                }

                loop {
                    if cancel.is_cancelled() {
                        return None;
                    }

                    if let Some(item) = queue.pop() {
                        return Some((
                            Ok(item),
                            (bytes_stream, decoder, parser, queue, done, cancel),
                        ));
                    }

                    let next = tokio::select! {
                        _ = cancel.cancelled() => return None,
                        next = bytes_stream.next() => next,
                    };

                    match next {
                        Some(Ok(chunk)) => {
                            for line in decoder.append(&chunk) {
                                parser.parse(&line);
                            }
                        }
                        Some(Err(e)) => {
                            done = true;
                            return Some((
                                Err(Error::Transport(e.into())),
                                (bytes_stream, decoder, parser, queue, done, cancel),
                            ));
                        }
                        None => return None,
                    }
                }
            },
        );

        Self {
            inner: Box::pin(stream),
            cancel,
            last_event_id,
        }
    }

    /// Ends the stream at the next poll without consuming more bytes.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    /// The committed last-event-id as of the most recent dispatched event.
    pub fn last_event_id(&self) -> String {
        self.last_event_id.get()
    }

    pub fn last_event_id_handle(&self) -> LastEventId {
        self.last_event_id.clone()
    }
}

impl Stream for EventStream {
    type Item = Result<StreamItem, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}
