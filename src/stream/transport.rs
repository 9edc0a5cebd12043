use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::connector::Connector;
use super::frame::{decode_frame, FrameDecode};
use crate::errors::ReconnectPolicy;
use crate::events::{StreamEvent, Tagged};

struct ActiveStream {
    stream_id: String,
    epoch: u64,
    cancel: CancellationToken,
}

/// Owns one live telemetry connection and turns its frames into [`StreamEvent`]s.
///
/// Events go to the single subscriber registered at construction, tagged with the
/// epoch passed to [`StreamTransport::open`]. The transport knows nothing about
/// results or aggregation.
pub struct StreamTransport<C: Connector, T> {
    connector: Arc<C>,
    policy: ReconnectPolicy,
    subscriber: mpsc::UnboundedSender<T>,
    dropped_frames: Arc<AtomicU64>,
    active: Option<ActiveStream>,
}

impl<C, T> StreamTransport<C, T>
where
    C: Connector,
    T: From<Tagged<StreamEvent>> + Send + 'static,
{
    pub fn new(connector: Arc<C>, policy: ReconnectPolicy, subscriber: mpsc::UnboundedSender<T>) -> Self {
        Self {
            connector,
            policy,
            subscriber,
            dropped_frames: Arc::new(AtomicU64::new(0)),
            active: None,
        }
    }

    /// Connect to `stream_id`, replacing any connection already open.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(&mut self, stream_id: &str, epoch: u64) {
        self.close();

        let cancel = CancellationToken::new();
        let worker = StreamWorker {
            connector: self.connector.clone(),
            policy: self.policy,
            subscriber: self.subscriber.clone(),
            dropped_frames: self.dropped_frames.clone(),
            stream_id: stream_id.to_string(),
            epoch,
            cancel: cancel.clone(),
        };
        tokio::spawn(worker.run());

        info!(stream_id = %stream_id, epoch, "Stream transport opened");
        self.active = Some(ActiveStream {
            stream_id: stream_id.to_string(),
            epoch,
            cancel,
        });
    }

    /// Close the connection and cancel any pending reconnect. Not reported as a failure.
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            debug!(stream_id = %active.stream_id, epoch = active.epoch, "Stream transport closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.active.as_ref().is_some_and(|a| !a.cancel.is_cancelled())
    }

    /// Frames dropped because they were malformed or of an unknown type.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }
}

impl<C: Connector, T> Drop for StreamTransport<C, T> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }
}

struct StreamWorker<C, T> {
    connector: Arc<C>,
    policy: ReconnectPolicy,
    subscriber: mpsc::UnboundedSender<T>,
    dropped_frames: Arc<AtomicU64>,
    stream_id: String,
    epoch: u64,
    cancel: CancellationToken,
}

impl<C, T> StreamWorker<C, T>
where
    C: Connector,
    T: From<Tagged<StreamEvent>> + Send + 'static,
{
    fn emit(&self, event: StreamEvent) -> bool {
        self.subscriber.send(T::from(Tagged::new(self.epoch, event))).is_ok()
    }

    async fn run(self) {
        // Reconnects since the last successfully decoded frame.
        let mut attempt: u32 = 0;

        loop {
            let connected = tokio::select! {
                _ = self.cancel.cancelled() => return,
                result = self.connector.connect(&self.stream_id) => result,
            };

            match connected {
                Ok(mut frames) => {
                    info!(stream_id = %self.stream_id, attempt, "Stream connected");
                    if !self.emit(StreamEvent::Connected { attempt }) {
                        return;
                    }

                    loop {
                        let next = tokio::select! {
                            _ = self.cancel.cancelled() => return,
                            next = frames.next() => next,
                        };
                        match next {
                            Some(Ok(raw)) => match decode_frame(&raw) {
                                FrameDecode::Event(event) => {
                                    attempt = 0;
                                    if !self.emit(event) {
                                        return;
                                    }
                                }
                                FrameDecode::Ignored { kind } => {
                                    self.dropped_frames.fetch_add(1, Ordering::Relaxed);
                                    debug!(stream_id = %self.stream_id, kind = %kind, "Ignoring frame of unknown type");
                                }
                                FrameDecode::Malformed(reason) => {
                                    self.dropped_frames.fetch_add(1, Ordering::Relaxed);
                                    warn!(stream_id = %self.stream_id, reason = %reason, "Dropping malformed frame");
                                }
                            },
                            Some(Err(e)) => {
                                warn!(stream_id = %self.stream_id, error = %e, "Stream read failed");
                                break;
                            }
                            None => {
                                warn!(stream_id = %self.stream_id, "Stream closed by server");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(stream_id = %self.stream_id, attempt, error = %e, "Stream connect failed");
                }
            }

            if self.cancel.is_cancelled() {
                return;
            }

            attempt += 1;
            if !self.policy.allows(attempt) {
                error!(
                    stream_id = %self.stream_id,
                    max_attempts = self.policy.max_attempts,
                    "Reconnect attempts exhausted"
                );
                self.emit(StreamEvent::Error(format!(
                    "Live stream for scan {} lost after {} reconnect attempts",
                    self.stream_id, self.policy.max_attempts
                )));
                return;
            }

            let delay = self.policy.delay_for(attempt);
            info!(
                stream_id = %self.stream_id,
                attempt,
                max_attempts = self.policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting stream"
            );
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
