//! Worker pool for synchronous CPU-heavy jobs (password hashing, image resizing).
//!
//! Two queues: `immed` for jobs a request is waiting on, `normal` for
//! everything else. Dedicated threads serve only `immed`; shared threads
//! prefer `immed` and fall back to `normal`.

use flume::{Receiver, Sender};
use futures::channel::oneshot;
use std::{sync::Arc, thread};

use crate::prelude::*;

type Job = Box<dyn FnOnce() + Send>;
type JobQueue = Arc<Receiver<Job>>;

#[derive(Debug)]
pub struct WorkerPool {
	immed: Sender<Job>,
	normal: Sender<Job>,
}

impl WorkerPool {
	/// `n_immed` threads serve only immediate jobs, `n_shared` serve both queues
	pub fn new(n_immed: usize, n_shared: usize) -> Self {
		let (immed, rx_immed) = flume::unbounded();
		let (normal, rx_normal) = flume::unbounded();

		let rx_immed = Arc::new(rx_immed);
		let rx_normal = Arc::new(rx_normal);

		for _ in 0..n_immed {
			let rx_immed = Arc::clone(&rx_immed);
			thread::spawn(move || worker_loop(&[rx_immed]));
		}

		for _ in 0..n_shared.max(1) {
			let rx_immed = Arc::clone(&rx_immed);
			let rx_normal = Arc::clone(&rx_normal);
			thread::spawn(move || worker_loop(&[rx_immed, rx_normal]));
		}

		Self { immed, normal }
	}

	fn submit<F, T>(queue: &Sender<Job>, f: F) -> impl std::future::Future<Output = ClResult<T>> + use<F, T>
	where
		F: FnOnce() -> T + Send + 'static,
		T: Send + 'static,
	{
		let (res_tx, res_rx) = oneshot::channel();

		let job: Job = Box::new(move || {
			let result = f();
			let _ignore = res_tx.send(result);
		});

		if queue.send(job).is_err() {
			error!("Failed to send job to worker queue");
		}

		async move {
			res_rx.await.map_err(|_| {
				error!("Worker dropped result channel (task may have panicked)");
				Error::Internal("worker task failed".into())
			})
		}
	}

	pub fn run<F, T>(&self, f: F) -> impl std::future::Future<Output = ClResult<T>> + use<F, T>
	where
		F: FnOnce() -> T + Send + 'static,
		T: Send + 'static,
	{
		Self::submit(&self.normal, f)
	}

	pub fn run_immed<F, T>(&self, f: F) -> impl std::future::Future<Output = ClResult<T>> + use<F, T>
	where
		F: FnOnce() -> T + Send + 'static,
		T: Send + 'static,
	{
		Self::submit(&self.immed, f)
	}

	/// Like `run`, but flattens `ClResult<ClResult<T>>` into `ClResult<T>`.
	pub fn try_run<F, T>(&self, f: F) -> impl std::future::Future<Output = ClResult<T>> + use<F, T>
	where
		F: FnOnce() -> ClResult<T> + Send + 'static,
		T: Send + 'static,
	{
		let fut = self.run(f);
		async move { fut.await? }
	}

	/// Like `run_immed`, but flattens `ClResult<ClResult<T>>` into `ClResult<T>`.
	pub fn try_run_immed<F, T>(
		&self,
		f: F,
	) -> impl std::future::Future<Output = ClResult<T>> + use<F, T>
	where
		F: FnOnce() -> ClResult<T> + Send + 'static,
		T: Send + 'static,
	{
		let fut = self.run_immed(f);
		async move { fut.await? }
	}
}

fn worker_loop(queues: &[JobQueue]) {
	loop {
		// Try higher-priority queues first (non-blocking)
		let mut job = None;
		for rx in queues {
			if let Ok(j) = rx.try_recv() {
				job = Some(j);
				break;
			}
		}

		if let Some(job) = job {
			if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)) {
				error!("Worker thread caught panic: {:?}", e);
			}
			continue;
		}

		let mut selector = flume::Selector::new();
		for rx in queues {
			selector = selector.recv(rx, |res| res);
		}

		match selector.wait() {
			Ok(job) => {
				if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)) {
					error!("Worker thread caught panic: {:?}", e);
				}
			}
			// All senders dropped: pool is gone
			Err(flume::RecvError::Disconnected) => return,
		}
	}
}


// vim: ts=4
