// Stream client - Live speed subscription over WebSocket with reconnects
use crate::application::error::ClientError;
use crate::domain::speed::{DEFAULT_UNIT, SpeedSample};
use crate::infrastructure::config::ReconnectPolicy;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

const EVENT_BUFFER: usize = 256;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Sample(SpeedSample),
    Connected,
    /// `retry_in` is `None` once the client has given up.
    Disconnected {
        reason: String,
        retry_in: Option<Duration>,
    },
}

#[derive(Debug, Deserialize)]
struct SampleMessage {
    speed: f64,
    #[serde(default)]
    unit: Option<String>,
}

/// Parses one stream frame. Only `speed` is required.
pub fn parse_sample(payload: &[u8]) -> Result<SpeedSample, ClientError> {
    let message: SampleMessage = serde_json::from_slice(payload)
        .map_err(|e| ClientError::Protocol(format!("invalid sample frame: {}", e)))?;

    Ok(SpeedSample::new(
        message.speed,
        message.unit.unwrap_or_else(|| DEFAULT_UNIT.to_string()),
    ))
}

#[derive(Debug, Clone)]
pub struct StreamClient {
    url: String,
    policy: ReconnectPolicy,
}

impl StreamClient {
    pub fn new(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        Self {
            url: url.into(),
            policy,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Starts the connection task. Must be called inside a tokio runtime.
    pub fn subscribe(&self) -> Subscription {
        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_connection(
            self.url.clone(),
            self.policy.clone(),
            tx,
            shutdown_rx,
        ));

        Subscription {
            events,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

pub struct Subscription {
    events: mpsc::Receiver<StreamEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Next event, or `None` once the subscription has ended.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }

    /// Closes the connection and waits for the task to wind down. Events
    /// already buffered can still be drained afterwards.
    pub async fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        // Fails any send the task is parked on when the buffer is full
        self.events.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(error = %e, "Stream task ended abnormally");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

enum PumpExit {
    Shutdown,
    Dropped(String),
}

async fn run_connection(
    url: String,
    policy: ReconnectPolicy,
    tx: mpsc::Sender<StreamEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut attempts: u32 = 0;
    let mut backoff = policy.initial_backoff();

    loop {
        info!(url = %url, "Connecting to telemetry stream");
        let connected = tokio::select! {
            _ = &mut shutdown => return,
            result = connect_async(url.as_str()) => result,
        };

        let reason = match connected {
            Ok((ws, _)) => {
                attempts = 0;
                backoff = policy.initial_backoff();
                if tx.send(StreamEvent::Connected).await.is_err() {
                    return;
                }
                info!(url = %url, "Telemetry stream connected");

                match pump(ws, &tx, &mut shutdown).await {
                    PumpExit::Shutdown => return,
                    PumpExit::Dropped(reason) => reason,
                }
            }
            Err(e) => {
                attempts += 1;
                format!("connect failed: {}", e)
            }
        };

        let retry_in = policy.allows(attempts).then_some(backoff);
        warn!(
            reason = %reason,
            attempt = attempts,
            retry_ms = retry_in.map(|d| d.as_millis() as u64),
            "Telemetry stream disconnected"
        );
        let event = StreamEvent::Disconnected {
            reason,
            retry_in,
        };
        if tx.send(event).await.is_err() {
            return;
        }

        let Some(delay) = retry_in else {
            warn!(url = %url, attempts, "Giving up on telemetry stream");
            return;
        };

        tokio::select! {
            _ = &mut shutdown => return,
            _ = tokio::time::sleep(delay) => {}
        }
        backoff = policy.next_backoff(backoff);
    }
}

/// Forwards frames until the connection drops or shutdown is requested.
async fn pump(
    ws: WsStream,
    tx: &mpsc::Sender<StreamEvent>,
    shutdown: &mut oneshot::Receiver<()>,
) -> PumpExit {
    let (mut write, mut read) = ws.split();

    loop {
        let frame = tokio::select! {
            _ = &mut *shutdown => {
                let _ = write.send(Message::Close(None)).await;
                return PumpExit::Shutdown;
            }
            frame = read.next() => frame,
        };

        let payload = match frame {
            Some(Ok(Message::Text(text))) => text.as_bytes().to_vec(),
            Some(Ok(Message::Binary(bytes))) => bytes.to_vec(),
            Some(Ok(Message::Ping(data))) => {
                let _ = write.send(Message::Pong(data)).await;
                continue;
            }
            Some(Ok(Message::Close(frame))) => {
                let reason = frame
                    .map(|f| f.reason.to_string())
                    .unwrap_or_else(|| "close frame received".to_string());
                return PumpExit::Dropped(reason);
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return PumpExit::Dropped(format!("read error: {}", e)),
            None => return PumpExit::Dropped("stream ended".to_string()),
        };

        match parse_sample(&payload) {
            Ok(sample) => {
                debug!(speed = sample.speed, unit = %sample.unit, "Sample received");
                if tx.send(StreamEvent::Sample(sample)).await.is_err() {
                    // Nobody is listening any more
                    return PumpExit::Shutdown;
                }
            }
            Err(e) => warn!(error = %e, "Skipping malformed stream frame"),
        }
    }
}
