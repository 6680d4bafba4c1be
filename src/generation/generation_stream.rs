//! Streaming support: the chunk type, the observer side channel, and the two
//! stream shapes (async `futures::Stream`, sync `Iterator`) that drain a
//! per-call background worker.
//!
//! Both shapes share the same lifecycle: the worker runs the blocking
//! pipeline invocation while filling a channel; the consumer drains the
//! channel; once the channel closes, the worker is joined and its error, if
//! any, is yielded as the final item. Consumers that stop iterating do not
//! cancel the worker; it always runs the pipeline to completion.

use std::future::Future;
use std::pin::Pin;
use std::sync::mpsc as std_mpsc;
use std::task::{Context, Poll};
use std::thread;

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{Error, Result};

// region:    --- GenerationChunk

/// One incrementally produced fragment of generated text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationChunk {
	pub content: String,
}

impl GenerationChunk {
	pub fn new(content: impl Into<String>) -> Self {
		Self {
			content: content.into(),
		}
	}
}

// endregion: --- GenerationChunk

// region:    --- ChunkObserver

/// Side channel for progress notification: called once per streamed chunk,
/// in generation order, before the chunk is handed to the consumer.
///
/// The observer is notified even when the consumer has stopped iterating,
/// since the worker runs the pipeline to completion regardless.
pub trait ChunkObserver: Send + Sync {
	fn on_chunk(&self, chunk: &GenerationChunk);
}

// endregion: --- ChunkObserver

// region:    --- GenerationStream (async)

/// Async chunk stream: drains the worker's channel, then polls the worker's
/// join handle to completion before terminating.
///
/// Dropping the stream before exhaustion leaves the blocking worker task to
/// finish detached (stopping iteration is not cancellation).
pub struct GenerationStream {
	inner: ReceiverStream<GenerationChunk>,
	worker: Option<tokio::task::JoinHandle<Result<()>>>,

	// -- Set by poll_next
	/// Flag to not poll the channel or the worker again after termination.
	done: bool,
}

impl GenerationStream {
	pub(crate) fn new(rx: mpsc::Receiver<GenerationChunk>, worker: tokio::task::JoinHandle<Result<()>>) -> Self {
		Self {
			inner: ReceiverStream::new(rx),
			worker: Some(worker),
			done: false,
		}
	}
}

impl Stream for GenerationStream {
	type Item = Result<GenerationChunk>;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		let this = self.get_mut();

		if this.done {
			return Poll::Ready(None);
		}

		match Pin::new(&mut this.inner).poll_next(cx) {
			Poll::Ready(Some(chunk)) => Poll::Ready(Some(Ok(chunk))),
			Poll::Ready(None) => {
				// Channel closed; join the worker before terminating.
				let Some(worker) = this.worker.as_mut() else {
					this.done = true;
					return Poll::Ready(None);
				};

				match Pin::new(worker).poll(cx) {
					Poll::Ready(join_result) => {
						this.done = true;
						this.worker = None;
						match join_result {
							Ok(Ok(())) => Poll::Ready(None),
							Ok(Err(err)) => {
								tracing::error!("generation stream worker failed: {err}");
								Poll::Ready(Some(Err(err)))
							}
							Err(join_err) => Poll::Ready(Some(Err(Error::Internal(format!(
								"Generation stream worker panicked: {join_err}"
							))))),
						}
					}
					Poll::Pending => Poll::Pending,
				}
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

// endregion: --- GenerationStream (async)

// region:    --- GenerationStreamIter (sync)

/// Sync chunk iterator: blocks on the worker's channel, then joins the worker
/// thread once the channel disconnects.
///
/// Dropping the iterator early still joins the worker (after dropping the
/// receiving end so a blocked worker can drain), preserving the
/// run-to-completion contract.
pub struct GenerationStreamIter {
	rx: Option<std_mpsc::Receiver<GenerationChunk>>,
	worker: Option<thread::JoinHandle<Result<()>>>,
	done: bool,
}

impl GenerationStreamIter {
	pub(crate) fn new(rx: std_mpsc::Receiver<GenerationChunk>, worker: thread::JoinHandle<Result<()>>) -> Self {
		Self {
			rx: Some(rx),
			worker: Some(worker),
			done: false,
		}
	}

	fn join_worker(&mut self) -> Result<()> {
		let Some(worker) = self.worker.take() else {
			return Ok(());
		};
		match worker.join() {
			Ok(worker_result) => worker_result,
			Err(_) => Err(Error::Internal("Generation stream worker panicked".to_string())),
		}
	}
}

impl Iterator for GenerationStreamIter {
	type Item = Result<GenerationChunk>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done {
			return None;
		}

		let Some(rx) = self.rx.as_ref() else {
			self.done = true;
			return None;
		};

		match rx.recv() {
			Ok(chunk) => Some(Ok(chunk)),
			// Disconnected: the worker dropped its sender, so joining cannot block.
			Err(_) => {
				self.done = true;
				match self.join_worker() {
					Ok(()) => None,
					Err(err) => {
						tracing::error!("generation stream worker failed: {err}");
						Some(Err(err))
					}
				}
			}
		}
	}
}

impl Drop for GenerationStreamIter {
	fn drop(&mut self) {
		// Drop the receiver first so a worker blocked on a full channel can
		// drain, then join it to completion.
		self.rx.take();
		if let Err(err) = self.join_worker() {
			tracing::error!("generation stream worker failed after consumer drop: {err}");
		}
	}
}

// endregion: --- GenerationStreamIter (sync)
