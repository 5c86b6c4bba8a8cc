/*
[INPUT]:  Collection name, base URL and API key of a CocobaseClient
[OUTPUT]: Change events for the collection via a bounded channel
[POS]:    WebSocket layer - realtime subscription handling
[UPDATE]: When changing the realtime handshake or read loop
*/

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use serde_json::json;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, info, warn};

use crate::http::client::endpoint_from;
use crate::http::{CocobaseClient, CocobaseError, Result};
use crate::types::Event;

const EVENT_CHANNEL_CAPACITY: usize = 100;
const RAW_LOG_MAX_BYTES: usize = 256;

/// Live subscription to one collection
///
/// Dropping the connection closes the socket.
#[derive(Debug)]
pub struct Connection {
    name: String,
    collection: String,
    closed: Arc<AtomicBool>,
    close_tx: Mutex<Option<oneshot::Sender<()>>>,
    events: Option<mpsc::Receiver<Event>>,
}

impl Connection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Take the event receiver; later calls return `None`
    pub fn take_receiver(&mut self) -> Option<mpsc::Receiver<Event>> {
        self.events.take()
    }

    /// Next event, or `None` once the read loop has ended
    pub async fn recv(&mut self) -> Option<Event> {
        match self.events.as_mut() {
            Some(events) => events.recv().await,
            None => None,
        }
    }

    /// Close the socket; safe to call more than once
    pub async fn close(&self) {
        let sender = self.close_tx.lock().await.take();
        self.closed.store(true, Ordering::SeqCst);
        if let Some(sender) = sender {
            info!(name = %self.name, collection = %self.collection, "closing subscription");
            let _ = sender.send(());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl CocobaseClient {
    /// WebSocket URL for a collection's change feed
    pub fn realtime_url(&self, collection: &str) -> Result<Url> {
        let base = Url::parse(&self.base_url().replacen("http", "ws", 1))?;
        endpoint_from(&base, &["realtime", "collections", collection])
    }

    /// Subscribe to change events of a collection
    ///
    /// The connection is named `watch-{collection}` unless `name` is given.
    pub async fn watch_collection(
        &self,
        collection: &str,
        name: Option<&str>,
    ) -> Result<Connection> {
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("watch-{collection}"));
        let url = self.realtime_url(collection)?;

        let (ws_stream, _response) = connect_async(url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();

        let auth = json!({ "api_key": self.api_key().unwrap_or_default() });
        write.send(WsMessage::Text(auth.to_string().into())).await?;

        let (close_tx, mut close_rx) = oneshot::channel::<()>();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let closed = Arc::new(AtomicBool::new(false));

        let task_closed = closed.clone();
        let task_name = name.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    // fires on close() and when the Connection is dropped
                    _ = &mut close_rx => {
                        let _ = write.send(WsMessage::Close(None)).await;
                        break;
                    }
                    incoming = read.next() => {
                        match incoming {
                            Some(Ok(WsMessage::Close(frame))) => {
                                log_close_frame(&task_name, frame.as_ref());
                                let _ = write.send(WsMessage::Close(None)).await;
                                break;
                            }
                            Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                            Some(Ok(message)) => {
                                let Some(event) = parse_event(message) else {
                                    continue;
                                };
                                // a full channel must not block closing
                                tokio::select! {
                                    sent = event_tx.send(event) => {
                                        if sent.is_err() {
                                            debug!(name = %task_name, "event receiver dropped");
                                            break;
                                        }
                                    }
                                    _ = &mut close_rx => {
                                        let _ = write.send(WsMessage::Close(None)).await;
                                        break;
                                    }
                                }
                            }
                            Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                                break;
                            }
                            Some(Err(err)) => {
                                warn!(name = %task_name, error = %err, "subscription closed unexpectedly");
                                break;
                            }
                        }
                    }
                }
            }

            task_closed.store(true, Ordering::SeqCst);
            info!(name = %task_name, "subscription ended");
        });

        info!(name = %name, collection, "subscription opened");
        Ok(Connection {
            name,
            collection: collection.to_string(),
            closed,
            close_tx: Mutex::new(Some(close_tx)),
            events: Some(event_rx),
        })
    }

    /// Subscribe and invoke `callback` for every event on a spawned task
    pub async fn watch_collection_with<F>(
        &self,
        collection: &str,
        name: Option<&str>,
        mut callback: F,
    ) -> Result<Connection>
    where
        F: FnMut(Event) + Send + 'static,
    {
        let mut connection = self.watch_collection(collection, name).await?;
        let mut events = connection
            .take_receiver()
            .ok_or_else(|| CocobaseError::WebSocket("event receiver already taken".to_string()))?;

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                callback(event);
            }
        });

        Ok(connection)
    }
}

/// Close codes other than normal or going-away
fn is_unexpected_close(frame: Option<&CloseFrame>) -> bool {
    frame.is_some_and(|frame| !matches!(frame.code, CloseCode::Normal | CloseCode::Away))
}

fn log_close_frame(name: &str, frame: Option<&CloseFrame>) {
    match frame {
        Some(frame) if is_unexpected_close(Some(frame)) => {
            warn!(
                name,
                code = u16::from(frame.code),
                reason = frame.reason.as_str(),
                "subscription closed unexpectedly"
            );
        }
        _ => debug!(name, "subscription closed by server"),
    }
}

fn parse_event(message: WsMessage) -> Option<Event> {
    let parsed = match &message {
        WsMessage::Text(text) => serde_json::from_str::<Event>(text.as_str()),
        WsMessage::Binary(bytes) => serde_json::from_slice::<Event>(bytes),
        _ => return None,
    };

    match parsed {
        Ok(event) => Some(event),
        Err(err) => {
            let raw = match &message {
                WsMessage::Text(text) => text.as_str().to_string(),
                WsMessage::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                _ => String::new(),
            };
            warn!(
                error = %err,
                bytes = raw.len(),
                message = %truncate_for_log(&raw, RAW_LOG_MAX_BYTES),
                "skipping undecodable event"
            );
            None
        }
    }
}

fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}
