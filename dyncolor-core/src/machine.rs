//! Image load state machine.
//!
//! `Idle -> Loading -> {Success | Error}`, restartable from any state.
//!
//! The machine runs as a small actor: [`ImageLoadMachine`] is a cheap handle
//! that enqueues commands, and a background task owns the [`StatePublisher`],
//! the current generation and the in-flight cancellation token. Being the
//! only writer, the actor needs no locks. Fetches run in their own tasks and
//! report back with the generation they were started for; a result whose
//! generation is no longer current is dropped.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::deadline::DeadlineGuard;
use crate::error::LoadError;
use crate::fetch::{LoadedImage, RequestExecutor};
use crate::state::{LoadState, LoadStateStream, StatePublisher};

/// Monotonic id of a submission
type Generation = u64;

/// What a finished fetch task reports
type FetchOutcome = Option<Result<LoadedImage, LoadError>>;

#[derive(Debug)]
enum Command {
    Submit(String),
    Completed {
        generation: Generation,
        url: String,
        outcome: FetchOutcome,
    },
}

/// Handle to the load state machine
#[derive(Debug)]
pub struct ImageLoadMachine {
    commands: mpsc::UnboundedSender<Command>,
    current: watch::Receiver<LoadState>,
    scope: CancellationToken,
}

impl ImageLoadMachine {
    /// Start the machine on the current tokio runtime.
    ///
    /// Returns the handle and the single observer stream of transitions.
    pub fn spawn(
        executor: Arc<dyn RequestExecutor>,
        guard: DeadlineGuard,
    ) -> (Self, LoadStateStream) {
        let (publisher, stream) = StatePublisher::new();
        let current = publisher.watch();
        let (commands, rx) = mpsc::unbounded_channel();
        let scope = CancellationToken::new();

        let actor = Actor {
            publisher,
            executor,
            guard,
            generation: 0,
            in_flight: None,
            commands: commands.downgrade(),
            scope: scope.clone(),
        };
        tokio::spawn(actor.run(rx));

        let machine = Self {
            commands,
            current,
            scope,
        };
        (machine, stream)
    }

    /// Submit a URL. Returns immediately; progress arrives on the observer
    /// stream.
    pub fn submit(&self, url: impl Into<String>) {
        if self.is_shut_down() {
            warn!("load machine is shut down, submission ignored");
            return;
        }
        let url = url.into();
        if self.commands.send(Command::Submit(url)).is_err() {
            warn!("load machine is shut down, submission ignored");
        }
    }

    /// Snapshot of the current state
    pub fn current(&self) -> LoadState {
        self.current.borrow().clone()
    }

    /// Stop accepting submissions and cancel any in-flight load.
    pub fn shutdown(&self) {
        self.scope.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.scope.is_cancelled()
    }
}

impl Drop for ImageLoadMachine {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

struct Actor {
    publisher: StatePublisher,
    executor: Arc<dyn RequestExecutor>,
    guard: DeadlineGuard,
    generation: Generation,
    in_flight: Option<CancellationToken>,
    /// Weak so that fetch tasks do not keep the actor alive on their own
    commands: mpsc::WeakUnboundedSender<Command>,
    scope: CancellationToken,
}

impl Actor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                biased;

                _ = self.scope.cancelled() => break,
                command = rx.recv() => match command {
                    Some(Command::Submit(url)) => self.submit(url),
                    Some(Command::Completed { generation, url, outcome }) => {
                        self.complete(generation, &url, outcome)
                    }
                    None => break,
                },
            }
        }

        self.cancel_in_flight();
        debug!(generation = self.generation, "load machine stopped");
    }

    fn submit(&mut self, raw: String) {
        self.cancel_in_flight();
        self.generation += 1;
        let generation = self.generation;

        let url = raw.trim().to_string();
        if url.is_empty() {
            info!(generation, "rejected blank url");
            self.publisher
                .publish(LoadState::Error(LoadError::EmptyInput));
            return;
        }

        info!(generation, %url, "loading image");
        self.publisher.publish(LoadState::Loading);

        let Some(commands) = self.commands.upgrade() else {
            return;
        };

        let token = self.scope.child_token();
        self.in_flight = Some(token.clone());

        let executor = Arc::clone(&self.executor);
        let guard = self.guard;

        tokio::spawn(async move {
            let fetch = async {
                guard
                    .run(executor.execute(&url))
                    .await
                    .into_option()
                    .map(|result| result.map_err(LoadError::from))
            };

            let outcome = tokio::select! {
                _ = token.cancelled() => {
                    debug!(generation, %url, "load cancelled");
                    return;
                }
                outcome = fetch => outcome,
            };

            let _ = commands.send(Command::Completed {
                generation,
                url,
                outcome,
            });
        });
    }

    fn complete(
        &mut self,
        generation: Generation,
        url: &str,
        outcome: FetchOutcome,
    ) {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                url,
                "discarding superseded result"
            );
            return;
        }
        self.in_flight = None;

        let state = match outcome {
            Some(Ok(image)) => {
                info!(
                    generation,
                    url,
                    width = image.width(),
                    height = image.height(),
                    "image loaded"
                );
                LoadState::Success(image)
            }
            Some(Err(err)) => {
                warn!(generation, url, error = %err, "image load failed");
                LoadState::Error(err)
            }
            None => {
                warn!(
                    generation,
                    url,
                    deadline_ms = self.guard.deadline().as_millis() as u64,
                    "image load timed out"
                );
                LoadState::Error(LoadError::Timeout {
                    after: self.guard.deadline(),
                })
            }
        };

        self.publisher.publish(state);
    }

    fn cancel_in_flight(&mut self) {
        if let Some(token) = self.in_flight.take() {
            debug!(generation = self.generation, "cancelling in-flight load");
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use image::{DynamicImage, ImageBuffer, Rgba};

    struct Pending;

    #[async_trait::async_trait]
    impl RequestExecutor for Pending {
        async fn execute(
            &self,
            _url: &str,
        ) -> Result<LoadedImage, FetchError> {
            std::future::pending().await
        }
    }

    fn image(url: &str) -> LoadedImage {
        let px = ImageBuffer::from_pixel(2, 2, Rgba([40u8, 90, 160, 255]));
        LoadedImage::new(url, DynamicImage::ImageRgba8(px), 16)
    }

    fn actor(
        commands: &mpsc::UnboundedSender<Command>,
    ) -> (Actor, LoadStateStream) {
        let (publisher, stream) = StatePublisher::new();
        let actor = Actor {
            publisher,
            executor: Arc::new(Pending),
            guard: DeadlineGuard::default(),
            generation: 0,
            in_flight: None,
            commands: commands.downgrade(),
            scope: CancellationToken::new(),
        };
        (actor, stream)
    }

    #[tokio::test(start_paused = true)]
    async fn queued_result_of_superseded_load_is_discarded() {
        let (commands, _rx) = mpsc::unbounded_channel();
        let (mut actor, mut stream) = actor(&commands);
        let first = "https://a/first.png";
        let second = "https://a/second.png";

        actor.submit(first.to_string());
        actor.submit(second.to_string());
        assert!(matches!(stream.try_next(), Some(LoadState::Loading)));
        assert!(matches!(stream.try_next(), Some(LoadState::Loading)));

        // The first load finished before it noticed the cancellation.
        actor.complete(1, first, Some(Ok(image(first))));
        assert!(stream.try_next().is_none());
        assert!(actor.in_flight.is_some());

        actor.complete(2, second, Some(Ok(image(second))));
        match stream.try_next() {
            Some(LoadState::Success(loaded)) => {
                assert_eq!(&*loaded.source, second)
            }
            other => panic!("expected Success, got {:?}", other),
        }
        assert!(stream.try_next().is_none());
        assert!(actor.in_flight.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_outcome_is_reported_as_timeout() {
        let (commands, _rx) = mpsc::unbounded_channel();
        let (mut actor, mut stream) = actor(&commands);

        actor.submit("https://a/slow.png".to_string());
        assert!(matches!(stream.try_next(), Some(LoadState::Loading)));

        actor.complete(1, "https://a/slow.png", None);
        match stream.try_next() {
            Some(LoadState::Error(LoadError::Timeout { after })) => {
                assert_eq!(after, DeadlineGuard::default().deadline())
            }
            other => panic!("expected Timeout, got {:?}", other),
        }
    }
}
