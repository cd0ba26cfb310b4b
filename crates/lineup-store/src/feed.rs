//! Live collection feed over WebSocket.
//!
//! Connects, subscribes to the roster collection, and forwards every
//! SNAPSHOT frame into the caller's channel. The feed owns reconnection:
//! when the connection drops it retries with exponential backoff, and only
//! when the attempts run out does it close the channel, which downstream
//! treats as a lost subscription.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, sleep, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use lineup_core::ChangeBatch;

use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::frames::{FeedFrame, FeedFrameType};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handle for one open live-feed subscription.
///
/// Dropping the handle stops the feed task; [`close`](FeedHandle::close)
/// does the same but waits for the task to finish first.
pub struct FeedHandle {
    stop_tx: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl FeedHandle {
    /// Stops the feed task and closes the connection.
    pub async fn close(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.task.await {
            if e.is_panic() {
                warn!("Feed task panicked during shutdown");
            }
        }
    }
}

/// Opens the live feed for the configured collection.
///
/// Returns once the connection is up and the SUBSCRIBE frame is on the
/// wire; a refusal after that point arrives as an ERROR frame and is
/// handled inside the task.
pub async fn open_feed(
    config: &StoreConfig,
    access_token: Option<String>,
    updates: mpsc::Sender<ChangeBatch>,
) -> StoreResult<FeedHandle> {
    let url = config.feed_url()?;
    let ws = connect_and_subscribe(&url, &config.collection, access_token.as_deref()).await?;
    info!(collection = %config.collection, "Live feed subscribed");

    let (stop_tx, stop_rx) = oneshot::channel();
    let runner = FeedRunner {
        url,
        collection: config.collection.clone(),
        access_token,
        heartbeat_interval: config.heartbeat_interval,
        reconnect_base_delay: config.reconnect_base_delay,
        reconnect_max_delay: config.reconnect_max_delay,
        max_reconnect_attempts: config.max_reconnect_attempts,
        updates,
    };
    let task = tokio::spawn(runner.run(ws, stop_rx));
    Ok(FeedHandle { stop_tx, task })
}

async fn connect_and_subscribe(url: &str, collection: &str, token: Option<&str>) -> StoreResult<Ws> {
    let (mut ws, _) = connect_async(url).await?;
    let frame = FeedFrame::subscribe(collection, token);
    ws.send(Message::Text(frame.to_json()?.into())).await?;
    debug!(collection = %collection, "Sent SUBSCRIBE frame");
    Ok(ws)
}

/// Delay before reconnect attempt `attempt` (1-based): exponential backoff
/// from the base delay, capped at the maximum.
fn backoff_delay(base: Duration, max: Duration, attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    std::cmp::min(base * 2u32.pow(exp), max)
}

enum DriveEnd {
    /// The caller asked the feed to stop, or nobody is listening anymore.
    Stopped,
    /// The connection went away; reconnection may follow.
    Lost,
}

struct FeedRunner {
    url: String,
    collection: String,
    access_token: Option<String>,
    heartbeat_interval: Duration,
    reconnect_base_delay: Duration,
    reconnect_max_delay: Duration,
    max_reconnect_attempts: u32,
    updates: mpsc::Sender<ChangeBatch>,
}

impl FeedRunner {
    async fn run(self, first: Ws, mut stop_rx: oneshot::Receiver<()>) {
        let mut next = Some(first);
        let mut attempts: u32 = 0;

        loop {
            let ws = match next.take() {
                Some(ws) => ws,
                None => {
                    attempts += 1;
                    if attempts > self.max_reconnect_attempts {
                        warn!("Max feed reconnect attempts reached, giving up");
                        break;
                    }
                    let delay = backoff_delay(
                        self.reconnect_base_delay,
                        self.reconnect_max_delay,
                        attempts,
                    );
                    info!(
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Scheduling feed reconnect"
                    );
                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = &mut stop_rx => return,
                    }
                    match connect_and_subscribe(
                        &self.url,
                        &self.collection,
                        self.access_token.as_deref(),
                    )
                    .await
                    {
                        Ok(ws) => {
                            info!(attempt = attempts, "Feed reconnected");
                            attempts = 0;
                            ws
                        }
                        Err(e) => {
                            warn!(error = %e, "Feed reconnect failed");
                            continue;
                        }
                    }
                }
            };

            match self.drive(ws, &mut stop_rx).await {
                DriveEnd::Stopped => return,
                DriveEnd::Lost => {}
            }
        }
        // Dropping self.updates closes the channel; downstream sees the
        // subscription as lost.
    }

    async fn drive(&self, ws: Ws, stop_rx: &mut oneshot::Receiver<()>) -> DriveEnd {
        let (mut write, mut read) = ws.split();
        let mut heartbeat = interval(self.heartbeat_interval);

        loop {
            tokio::select! {
                _ = &mut *stop_rx => {
                    let frame = FeedFrame::unsubscribe(&self.collection);
                    if let Ok(json) = frame.to_json() {
                        let _ = write.send(Message::Text(json.into())).await;
                    }
                    let _ = write.send(Message::Close(None)).await;
                    info!("Live feed closed");
                    return DriveEnd::Stopped;
                }
                _ = heartbeat.tick() => {
                    let frame = FeedFrame::heartbeat();
                    if let Ok(json) = frame.to_json() {
                        if write.send(Message::Text(json.into())).await.is_err() {
                            return DriveEnd::Lost;
                        }
                    }
                }
                maybe_msg = read.next() => {
                    match maybe_msg {
                        Some(Ok(Message::Text(text))) => {
                            match self.handle_frame(&text).await {
                                FrameOutcome::Continue => {}
                                FrameOutcome::ReceiverGone => return DriveEnd::Stopped,
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = write.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) => {
                            info!("Feed connection closed by server");
                            return DriveEnd::Lost;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            warn!(error = %e, "Feed transport error");
                            return DriveEnd::Lost;
                        }
                        None => return DriveEnd::Lost,
                    }
                }
            }
        }
    }

    async fn handle_frame(&self, text: &str) -> FrameOutcome {
        match FeedFrame::from_json(text) {
            Ok(frame) => match frame.frame_type {
                FeedFrameType::Snapshot => {
                    let batch = ChangeBatch::new(frame.documents.unwrap_or_default());
                    debug!(documents = batch.documents.len(), "Feed snapshot received");
                    if self.updates.send(batch).await.is_err() {
                        debug!("Batch receiver dropped, closing feed");
                        return FrameOutcome::ReceiverGone;
                    }
                }
                FeedFrameType::Subscribed => {
                    debug!(collection = %self.collection, "Feed subscription confirmed");
                }
                FeedFrameType::Error => {
                    let error = frame.error.unwrap_or_else(|| "unknown error".to_string());
                    warn!(error = %error, "Feed error frame");
                }
                _ => {}
            },
            Err(e) => {
                warn!(error = %e, "Failed to parse feed frame");
            }
        }
        FrameOutcome::Continue
    }
}

enum FrameOutcome {
    Continue,
    ReceiverGone,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_base() {
        let base = Duration::from_secs(2);
        let max = Duration::from_secs(30);
        assert_eq!(backoff_delay(base, max, 1), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, max, 2), Duration::from_secs(4));
        assert_eq!(backoff_delay(base, max, 3), Duration::from_secs(8));
        assert_eq!(backoff_delay(base, max, 4), Duration::from_secs(16));
    }

    #[test]
    fn backoff_caps_at_max() {
        let base = Duration::from_secs(2);
        let max = Duration::from_secs(30);
        assert_eq!(backoff_delay(base, max, 5), Duration::from_secs(30));
        assert_eq!(backoff_delay(base, max, 12), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn open_feed_rejects_bad_config() {
        let mut config = StoreConfig::new("https://roster.example.co", "key");
        config.api_url = "not a url".to_string();
        let (tx, _rx) = mpsc::channel(8);
        let result = open_feed(&config, None, tx).await;
        assert!(result.is_err());
    }
}
