//! WebSocket subscription to the remote store's change feed.
//!
//! The feed delivers JSON `{collection, event, payload}` frames. This
//! module turns the socket into an [`mpsc`] channel of [`ChangeEvent`]s
//! consumed by the reconciler on the same runtime as mutation
//! application. Malformed frames are logged and skipped. Delivery is
//! at-least-once and unordered; the reconciler tolerates both.

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::SyncError;
use crate::reconciler::ChangeEvent;
use crate::remote::normalize_http_url;

/// Buffered events before the feed applies backpressure.
const FEED_CHANNEL_CAPACITY: usize = 256;

/// Handle to an open feed subscription. Closing it tears down the
/// socket task and ends the event channel.
#[derive(Debug)]
pub struct FeedHandle {
    task: JoinHandle<()>,
}

impl FeedHandle {
    pub fn close(self) {
        self.task.abort();
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Connects to the change feed and returns the event channel.
///
/// The channel closes when the server closes the connection or the
/// handle is dropped; there is no automatic reconnect.
pub async fn subscribe(
    server_url: &str,
    api_key: &str,
) -> Result<(FeedHandle, mpsc::Receiver<ChangeEvent>), SyncError> {
    let ws_url = build_feed_url(server_url, api_key);
    let (ws_stream, _) = connect_async(&ws_url)
        .await
        .map_err(|e| SyncError::Connection(e.to_string()))?;

    let (tx, rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);
    let task = tokio::spawn(feed_loop(ws_stream, tx));
    Ok((FeedHandle { task }, rx))
}

async fn feed_loop<S>(ws_stream: S, tx: mpsc::Sender<ChangeEvent>)
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + SinkExt<Message>
        + Unpin,
{
    let (mut sender, mut receiver) = ws_stream.split();

    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                if forward(parse_frame(text.as_str()), &tx).await.is_err() {
                    break;
                }
            }
            Ok(Message::Binary(data)) => {
                let text = String::from_utf8_lossy(&data);
                if forward(parse_frame(&text), &tx).await.is_err() {
                    break;
                }
            }
            Ok(Message::Ping(data)) => {
                let _ = sender.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => {
                tracing::debug!("change feed closed by server");
                break;
            }
            Ok(_) => {
                // Pong and raw frames carry nothing for us
            }
            Err(e) => {
                tracing::warn!(error = %e, "change feed connection error");
                break;
            }
        }
    }

    let _ = sender.send(Message::Close(None)).await;
}

/// Parses one feed frame. `None` means the frame was malformed and has
/// been logged and skipped.
fn parse_frame(text: &str) -> Option<ChangeEvent> {
    match serde_json::from_str::<ChangeEvent>(text) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, "skipping malformed feed frame");
            None
        }
    }
}

async fn forward(event: Option<ChangeEvent>, tx: &mpsc::Sender<ChangeEvent>) -> Result<(), ()> {
    match event {
        Some(event) => tx.send(event).await.map_err(|_| ()),
        None => Ok(()),
    }
}

/// Builds the websocket URL for the feed endpoint from a configured
/// server URL of any scheme.
fn build_feed_url(server_url: &str, api_key: &str) -> String {
    let http = normalize_http_url(server_url);
    let ws = if let Some(rest) = http.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else {
        format!("ws://{}", http.trim_start_matches("http://"))
    };
    format!("{}/feed?key={}", ws, urlencoding::encode(api_key))
}
