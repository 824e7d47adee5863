//! A dedicated thread owning the kernel.
//!
//! Requests are handled strictly in arrival order. Cancellation is left to
//! the caller: stamp requests with [`RequestTokens::next`] and drop any
//! response whose id is no longer current.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use thiserror::Error;

use crate::config::EngineConfig;
use crate::kernel::{panic_message, Kernel, MeshKernel};
use crate::message::{Request, Response};
use crate::mould::Engine;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("worker thread has stopped")]
    Disconnected,

    #[error("worker thread panicked: {0}")]
    Panicked(String),
}

/// Monotonic request ids; only the latest one is current.
#[derive(Debug, Default)]
pub struct RequestTokens {
    latest: AtomicU64,
}

impl RequestTokens {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new id, making every earlier one stale.
    pub fn next(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    #[must_use]
    pub fn is_current(&self, id: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == id
    }
}

/// Handle to the worker thread. Dropping it stops the thread once the
/// queued requests are done.
pub struct Worker {
    requests: Option<Sender<Request>>,
    responses: Receiver<Response>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    /// Starts a worker over a fresh faceted kernel.
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::Spawn` if the thread cannot be created.
    pub fn spawn(config: EngineConfig) -> Result<Self, WorkerError> {
        Self::spawn_with(Engine::<MeshKernel>::new(config))
    }

    /// Starts a worker that owns `engine`.
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::Spawn` if the thread cannot be created.
    pub fn spawn_with<K>(mut engine: Engine<K>) -> Result<Self, WorkerError>
    where
        K: Kernel + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel::<Request>();
        let (response_tx, response_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("slipcast-kernel".into())
            .spawn(move || {
                for request in request_rx {
                    if response_tx.send(engine.handle(request)).is_err() {
                        tracing::debug!("response receiver dropped; worker exiting");
                        break;
                    }
                }
            })?;
        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            thread: Some(thread),
        })
    }

    /// Queues a request.
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::Disconnected` if the thread has stopped.
    pub fn send(&self, request: Request) -> Result<(), WorkerError> {
        self.requests
            .as_ref()
            .ok_or(WorkerError::Disconnected)?
            .send(request)
            .map_err(|_| WorkerError::Disconnected)
    }

    /// Blocks until the next response.
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::Disconnected` if the thread has stopped.
    pub fn recv(&self) -> Result<Response, WorkerError> {
        self.responses.recv().map_err(|_| WorkerError::Disconnected)
    }

    /// Finishes the queued requests and joins the thread.
    ///
    /// # Errors
    ///
    /// Returns `WorkerError::Panicked` if the thread panicked.
    pub fn shutdown(mut self) -> Result<(), WorkerError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), WorkerError> {
        self.requests = None;
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|payload| WorkerError::Panicked(panic_message(payload.as_ref()))),
            None => Ok(()),
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(error = %err, "worker stopped abnormally");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::{Operation, Reply};
    use crate::mould::{Profile, ProfilePoint};

    fn cup() -> Profile {
        Profile::new(vec![
            ProfilePoint::line(0.0, 0.0),
            ProfilePoint::line(30.0, 0.0),
            ProfilePoint::line(34.0, 60.0),
        ])
    }

    #[test]
    fn responses_arrive_in_request_order() {
        let worker = Worker::spawn(EngineConfig::default()).unwrap();
        let tokens = RequestTokens::new();
        let ids: Vec<u64> = (0..3).map(|_| tokens.next()).collect();
        worker
            .send(Request {
                id: ids[0],
                operation: Operation::Revolve { profile: cup() },
            })
            .unwrap();
        worker
            .send(Request {
                id: ids[1],
                operation: Operation::GenerateMould {
                    profile: cup(),
                    params: crate::mould::MouldParameters::default(),
                },
            })
            .unwrap();
        worker
            .send(Request {
                id: ids[2],
                operation: Operation::HeapSize,
            })
            .unwrap();

        let received: Vec<Response> = (0..3).map(|_| worker.recv().unwrap()).collect();
        assert_eq!(
            received.iter().map(|r| r.id).collect::<Vec<_>>(),
            ids
        );
        assert!(matches!(received[0].result, Reply::Mesh { .. }));
        assert!(matches!(received[1].result, Reply::Parts { .. }));
        assert_eq!(received[2].result, Reply::HeapSize { bytes: Some(0) });
        worker.shutdown().unwrap();
    }

    #[test]
    fn only_latest_token_is_current() {
        let tokens = RequestTokens::new();
        let first = tokens.next();
        let second = tokens.next();
        assert!(second > first);
        assert!(!tokens.is_current(first));
        assert!(tokens.is_current(second));
    }

    #[test]
    fn drop_joins_thread() {
        let worker = Worker::spawn(EngineConfig::default()).unwrap();
        worker
            .send(Request {
                id: 1,
                operation: Operation::HeapSize,
            })
            .unwrap();
        drop(worker);
    }
}
