//! Compose progress stream reader.
//!
//! Opens the backend's event stream for a [`ComposeTarget`], decodes each
//! server-sent frame into a [`ComposeEvent`] and hands them to the caller
//! through a [`ComposeSubscription`]. The subscription is closed on
//! completion, on error, and whenever it is dropped.

use std::fmt::Display;

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use vitrine_core::composer::{
    parse_event, ComposeEvent, ComposePhase, ComposeTarget, ComposerWizard, EventEffect,
};

use crate::api::{ApiError, CmsApi};
use crate::sse::{SseDecoder, SseFrame};

/// Buffered events between the reader task and the subscriber.
const EVENT_BUFFER: usize = 32;

/// Errors from the compose stream.
#[derive(Debug, thiserror::Error)]
pub enum ComposeStreamError {
    #[error("Failed to open compose stream: {0}")]
    Open(#[from] ApiError),

    #[error("Compose stream failed: {0}")]
    Transport(String),

    #[error("Compose stream ended before the run finished")]
    Ended,
}

/// Live subscription to one compose run's events.
pub struct ComposeSubscription {
    rx: mpsc::Receiver<Result<ComposeEvent, ComposeStreamError>>,
    cancel: CancellationToken,
}

impl ComposeSubscription {
    /// Open the upstream stream and start reading it.
    pub async fn open(api: &CmsApi, target: &ComposeTarget) -> Result<Self, ComposeStreamError> {
        let response = api.open_compose_stream(target).await?;
        tracing::info!(
            store_id = %target.store_id,
            canvas_ids = %target.canvas_param(),
            "Compose stream opened",
        );
        Ok(Self::from_stream(response.bytes_stream()))
    }

    /// Read events from any byte stream carrying `text/event-stream`.
    pub fn from_stream<S, B, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
        E: Display + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();
        tokio::spawn(read_events(stream, tx, cancel.clone()));
        Self { rx, cancel }
    }

    /// Next event, or `None` once the stream ended or was closed.
    pub async fn next(&mut self) -> Option<Result<ComposeEvent, ComposeStreamError>> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            item = self.rx.recv() => item,
        }
    }

    /// Stop reading. Buffered events are discarded.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.rx.close();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token that closes this subscription from elsewhere.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for ComposeSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Feed a begun wizard from its subscription until the stream closes.
///
/// `on_change` sees the wizard after every event that changed it. A
/// transport error, or the stream ending while the wizard is still in
/// `Progress`, fails the run. Returns the final phase.
pub async fn drive<F>(
    wizard: &Mutex<ComposerWizard>,
    subscription: &mut ComposeSubscription,
    mut on_change: F,
) -> ComposePhase
where
    F: FnMut(&ComposerWizard),
{
    while let Some(item) = subscription.next().await {
        let mut wizard = wizard.lock().await;
        let effect = match item {
            Ok(event) => wizard.apply_event(&event),
            Err(e) => {
                wizard.fail(e.to_string());
                EventEffect::Failed
            }
        };
        if effect != EventEffect::Ignored {
            on_change(&wizard);
        }
        if effect.closes_stream() {
            subscription.close();
            tracing::info!(phase = wizard.phase().as_str(), "Compose run finished");
            return wizard.phase();
        }
    }

    let mut wizard = wizard.lock().await;
    if !subscription.is_closed() && wizard.phase() == ComposePhase::Progress {
        wizard.fail(ComposeStreamError::Ended.to_string());
        on_change(&wizard);
        tracing::warn!("Compose stream ended without a final event");
    }
    wizard.phase()
}

// ---- reader task ----

async fn read_events<S, B, E>(
    stream: S,
    tx: mpsc::Sender<Result<ComposeEvent, ComposeStreamError>>,
    cancel: CancellationToken,
) where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let mut stream = Box::pin(stream);
    let mut decoder = SseDecoder::new();

    loop {
        let chunk = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Compose stream closed by subscriber");
                return;
            }
            chunk = stream.next() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => {
                for frame in decoder.feed(bytes.as_ref()) {
                    if !forward(&frame, &tx).await {
                        return;
                    }
                }
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Compose stream receive error");
                let _ = tx
                    .send(Err(ComposeStreamError::Transport(e.to_string())))
                    .await;
                return;
            }
            None => {
                if let Some(frame) = decoder.finish() {
                    forward(&frame, &tx).await;
                }
                tracing::debug!("Compose stream exhausted");
                return;
            }
        }
    }
}

/// Parse and forward one frame. Returns `false` once the subscriber is gone.
async fn forward(
    frame: &SseFrame,
    tx: &mpsc::Sender<Result<ComposeEvent, ComposeStreamError>>,
) -> bool {
    match parse_event(&frame.data) {
        Ok(event) => tx.send(Ok(event)).await.is_ok(),
        Err(e) => {
            tracing::warn!(
                error = %e,
                raw_event = %frame.data,
                "Failed to parse compose event",
            );
            true
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
