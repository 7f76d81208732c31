//! Load state and its publisher.
//!
//! The publisher is the single writer of the current [`LoadState`]. It keeps
//! a snapshot in a watch channel for cheap reads and pushes every transition,
//! in order and without coalescing, to exactly one observer stream.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::LoadError;
use crate::fetch::LoadedImage;

/// Phase of an image load attempt
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    /// No request in flight and no prior result
    #[default]
    Idle,

    /// A request is in flight
    Loading,

    /// The image was fetched and decoded
    Success(LoadedImage),

    /// The submission failed
    Error(LoadError),
}

impl LoadState {
    /// Whether this state ends a submission
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoadState::Success(_) | LoadState::Error(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    /// The loaded image, if this is a success
    pub fn image(&self) -> Option<&LoadedImage> {
        match self {
            LoadState::Success(image) => Some(image),
            _ => None,
        }
    }

    /// The failure, if this is an error
    pub fn error(&self) -> Option<&LoadError> {
        match self {
            LoadState::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Short label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            LoadState::Idle => "idle",
            LoadState::Loading => "loading",
            LoadState::Success(_) => "success",
            LoadState::Error(_) => "error",
        }
    }
}

/// Owner of the current load state
#[derive(Debug)]
pub struct StatePublisher {
    current: watch::Sender<LoadState>,
    observer: mpsc::UnboundedSender<LoadState>,
}

impl StatePublisher {
    /// Create a publisher in the `Idle` state together with its only
    /// observer stream.
    pub fn new() -> (Self, LoadStateStream) {
        let (current, _) = watch::channel(LoadState::Idle);
        let (observer, rx) = mpsc::unbounded_channel();

        let publisher = Self { current, observer };
        let stream = LoadStateStream {
            inner: UnboundedReceiverStream::new(rx),
        };

        (publisher, stream)
    }

    /// Replace the current state and notify the observer.
    pub fn publish(&self, state: LoadState) {
        tracing::trace!(state = state.label(), "publishing load state");

        self.current.send_replace(state.clone());

        // Ignore send errors (observer dropped)
        let _ = self.observer.send(state);
    }

    /// Snapshot of the current state
    pub fn current(&self) -> LoadState {
        self.current.borrow().clone()
    }

    /// Latest-value reader. Intermediate states may be skipped; use the
    /// observer stream to see every transition.
    pub fn watch(&self) -> watch::Receiver<LoadState> {
        self.current.subscribe()
    }
}

/// Ordered stream of every published transition
#[derive(Debug)]
pub struct LoadStateStream {
    inner: UnboundedReceiverStream<LoadState>,
}

impl LoadStateStream {
    /// Wait for the next transition. `None` once the publisher is gone and
    /// all pending transitions were drained.
    pub async fn next(&mut self) -> Option<LoadState> {
        futures::StreamExt::next(&mut self.inner).await
    }

    /// Take a transition that is already queued, without waiting.
    pub fn try_next(&mut self) -> Option<LoadState> {
        self.inner.as_mut().try_recv().ok()
    }
}

impl Stream for LoadStateStream {
    type Item = LoadState;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
