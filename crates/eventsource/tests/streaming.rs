use bytes::Bytes;
use eventsource::streaming::{EventStream, StreamItem};
use eventsource::Error;
use futures_util::StreamExt;
use std::convert::Infallible;
use std::time::Duration;

fn chunked(chunks: &[&'static [u8]]) -> EventStream {
    let items: Vec<Result<Bytes, Infallible>> = chunks
        .iter()
        .map(|c| Ok(Bytes::from_static(c)))
        .collect();
    EventStream::new(
        futures_util::stream::iter(items),
        "",
        Duration::from_secs(3),
    )
}

#[tokio::test]
async fn yields_messages_and_comments_across_chunk_boundaries() {
    let mut stream = chunked(&[
        b"event: greeting\ndata: hel",
        b"lo\n\n: keep-alive\nid: 7\ndata: again\n\n",
    ]);

    let mut items = Vec::new();
    while let Some(item) = stream.next().await {
        items.push(item.unwrap());
    }

    assert_eq!(
        items,
        [
            StreamItem::Message {
                event_type: "greeting".to_string(),
                event: eventsource::MessageEvent {
                    data: "hello".to_string(),
                    last_event_id: "".to_string(),
                },
            },
            StreamItem::Comment("keep-alive".to_string()),
            StreamItem::Message {
                event_type: "message".to_string(),
                event: eventsource::MessageEvent {
                    data: "again".to_string(),
                    last_event_id: "7".to_string(),
                },
            },
        ]
    );
    assert_eq!(stream.last_event_id(), "7");
}

#[tokio::test]
async fn unterminated_trailing_event_is_discarded() {
    let mut stream = chunked(&[b"data: complete\n\ndata: dangling"]);

    let mut items = Vec::new();
    while let Some(item) = stream.next().await {
        items.push(item.unwrap());
    }

    assert_eq!(items.len(), 1);
    match &items[0] {
        StreamItem::Message { event, .. } => assert_eq!(event.data, "complete"),
        other => panic!("expected message, got {other:?}"),
    }
}

#[tokio::test]
async fn transport_error_surfaces_then_stream_ends() {
    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"data: x\n\n")),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
    ];
    let mut stream = EventStream::new(
        futures_util::stream::iter(chunks),
        "",
        Duration::from_secs(3),
    );

    let first = stream.next().await.unwrap().unwrap();
    match first {
        StreamItem::Message { event, .. } => assert_eq!(event.data, "x"),
        other => panic!("expected message, got {other:?}"),
    }

    let second = stream.next().await.unwrap();
    assert!(matches!(second, Err(Error::Transport(_))));
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn abort_ends_the_stream() {
    let pending = futures_util::stream::pending::<Result<Bytes, Infallible>>();
    let mut stream = EventStream::new(pending, "", Duration::from_secs(3));
    stream.abort();
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn initial_last_event_id_is_visible_until_replaced() {
    let mut stream = chunked(&[b"id: next\ndata: x\n\n"]);
    let handle = stream.last_event_id_handle();
    assert_eq!(handle.get(), "");

    // Resumed sessions seed the id at construction.
    let seeded = EventStream::new(
        futures_util::stream::iter(Vec::<Result<Bytes, Infallible>>::new()),
        "session-9",
        Duration::from_secs(3),
    );
    assert_eq!(seeded.last_event_id(), "session-9");

    while let Some(item) = stream.next().await {
        item.unwrap();
    }
    assert_eq!(handle.get(), "next");
}
