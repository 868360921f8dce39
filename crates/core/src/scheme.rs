//! Scheme-task integration between a web content engine and the resolver.
//!
//! A content engine hands each `local://` request to [`LocalSchemeHandler::start`]
//! as a [`SchemeTask`] and may later call [`LocalSchemeHandler::stop`] when the
//! request is no longer needed. Resolution runs off the caller's thread; the
//! result is delivered through the task's [`SchemeTaskSink`].
//!
//! Every task ends in exactly one of three ways: served (response, data,
//! finish), failed (one `did_fail`), or cancelled (nothing further is
//! delivered once `stop` has been observed).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, ReentrantMutex};
use tabhost_runtime::{Error, Result};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::resolver::{ResolvedResource, ResourceResolver};

/// Size of each `did_receive_data` chunk.
pub const DATA_CHUNK_SIZE: usize = 64 * 1024;

/// Identifier of one in-flight scheme task.
pub type TaskId = u64;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Returns a new process-unique task id.
pub fn next_task_id() -> TaskId {
	NEXT_TASK_ID.fetch_add(1, Ordering::SeqCst)
}

/// Receiver of incremental response delivery for one task.
pub trait SchemeTaskSink: Send + Sync {
	fn did_receive_response(&self, mime_type: &str, expected_length: usize);
	fn did_receive_data(&self, data: &[u8]);
	fn did_finish(&self);
	fn did_fail(&self, error: &Error);
}

/// One custom-scheme request issued by a content engine.
#[derive(Clone)]
pub struct SchemeTask {
	id: TaskId,
	address: String,
	sink: Arc<dyn SchemeTaskSink>,
}

impl SchemeTask {
	pub fn new(address: impl Into<String>, sink: Arc<dyn SchemeTaskSink>) -> Self {
		Self {
			id: next_task_id(),
			address: address.into(),
			sink,
		}
	}

	pub fn id(&self) -> TaskId {
		self.id
	}

	pub fn address(&self) -> &str {
		&self.address
	}
}

impl fmt::Debug for SchemeTask {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SchemeTask")
			.field("id", &self.id)
			.field("address", &self.address)
			.finish()
	}
}

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
	Served { mime_type: &'static str, len: usize },
	Failed { code: &'static str, message: String },
	Cancelled,
}

/// Request-scoped cancellation flag.
///
/// Delivery steps run under `gate` and [`Self::stop`] takes the same lock, so
/// once `stop` returns true no later step reaches the sink. The lock is
/// reentrant: a sink may stop its own task from inside a callback.
#[derive(Debug, Default)]
pub struct StopSignal {
	gate: ReentrantMutex<()>,
	stopped: AtomicBool,
	settled: AtomicBool,
	notify: Notify,
}

impl StopSignal {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stops further delivery. Blocks while a step is being delivered on
	/// another thread. Returns false if the terminal step was already reached.
	pub fn stop(&self) -> bool {
		let _gate = self.gate.lock();
		if self.settled.load(Ordering::SeqCst) {
			return false;
		}
		self.stopped.store(true, Ordering::SeqCst);
		self.notify.notify_waiters();
		true
	}

	pub fn is_stopped(&self) -> bool {
		self.stopped.load(Ordering::SeqCst)
	}

	/// Resolves once [`Self::stop`] has been called.
	pub async fn stopped(&self) {
		loop {
			// Register before checking the flag so a concurrent stop() is not missed.
			let notified = self.notify.notified();
			tokio::pin!(notified);
			notified.as_mut().enable();

			if self.is_stopped() {
				return;
			}
			notified.await;
		}
	}

	/// Runs `step` unless stopped. A terminal step settles the signal before
	/// it runs, so a later `stop` reports false.
	fn deliver(&self, terminal: bool, step: impl FnOnce()) -> bool {
		let _gate = self.gate.lock();
		if self.is_stopped() {
			return false;
		}
		if terminal {
			self.settled.store(true, Ordering::SeqCst);
		}
		step();
		true
	}
}

/// Delivers at most one terminal outcome to a sink.
///
/// Consumed by `serve`/`fail`, so a second terminal call does not type-check.
struct TaskResponder {
	sink: Arc<dyn SchemeTaskSink>,
	stop: Arc<StopSignal>,
}

impl TaskResponder {
	fn serve(self, resource: &ResolvedResource) -> TaskOutcome {
		let sink = &self.sink;
		if !self.stop.deliver(false, || sink.did_receive_response(resource.mime_type, resource.len())) {
			return TaskOutcome::Cancelled;
		}

		for chunk in resource.bytes.chunks(DATA_CHUNK_SIZE) {
			if !self.stop.deliver(false, || sink.did_receive_data(chunk)) {
				return TaskOutcome::Cancelled;
			}
		}

		if !self.stop.deliver(true, || sink.did_finish()) {
			return TaskOutcome::Cancelled;
		}
		TaskOutcome::Served {
			mime_type: resource.mime_type,
			len: resource.len(),
		}
	}

	fn fail(self, error: &Error) -> TaskOutcome {
		if !self.stop.deliver(true, || self.sink.did_fail(error)) {
			return TaskOutcome::Cancelled;
		}
		TaskOutcome::Failed {
			code: error.code(),
			message: error.to_string(),
		}
	}
}

/// `local://` handler registered with one content engine.
pub struct LocalSchemeHandler {
	resolver: Arc<ResourceResolver>,
	active: Mutex<HashMap<TaskId, Arc<StopSignal>>>,
}

impl LocalSchemeHandler {
	pub fn new(resolver: Arc<ResourceResolver>) -> Self {
		Self {
			resolver,
			active: Mutex::new(HashMap::new()),
		}
	}

	pub fn resolver(&self) -> &Arc<ResourceResolver> {
		&self.resolver
	}

	/// Number of tasks started and not yet finished.
	pub fn active_tasks(&self) -> usize {
		self.active.lock().len()
	}

	/// Starts serving `task` on the runtime and returns its join handle.
	///
	/// Must be called from within a tokio runtime.
	pub fn start(self: &Arc<Self>, task: SchemeTask) -> JoinHandle<TaskOutcome> {
		let stop = Arc::new(StopSignal::new());
		self.active.lock().insert(task.id, Arc::clone(&stop));
		trace!(target = "tabhost.scheme", task = task.id, address = %task.address, "scheme task started");

		let handler = Arc::clone(self);
		tokio::spawn(async move {
			let id = task.id;
			let outcome = handler.serve(task, stop).await;
			handler.active.lock().remove(&id);
			outcome
		})
	}

	/// Cancels an in-flight task. Returns false if the id is unknown or the
	/// task already finished. Once this returns true the sink receives
	/// nothing further.
	pub fn stop(&self, task_id: TaskId) -> bool {
		let Some(signal) = self.active.lock().remove(&task_id) else {
			return false;
		};
		let stopped = signal.stop();
		debug!(target = "tabhost.scheme", task = task_id, stopped, "scheme task stop requested");
		stopped
	}

	/// Resolves `task` and delivers the outcome unless `stop` fires first.
	pub async fn serve(&self, task: SchemeTask, stop: Arc<StopSignal>) -> TaskOutcome {
		let responder = TaskResponder {
			sink: Arc::clone(&task.sink),
			stop: Arc::clone(&stop),
		};

		let resolver = Arc::clone(&self.resolver);
		let address = task.address.clone();
		let lookup = tokio::task::spawn_blocking(move || resolver.resolve_address(&address));

		let resolved: Result<ResolvedResource> = tokio::select! {
			biased;
			_ = stop.stopped() => return TaskOutcome::Cancelled,
			joined = lookup => match joined {
				Ok(result) => result,
				Err(err) => Err(Error::Io(std::io::Error::other(err.to_string()))),
			},
		};

		let outcome = match resolved {
			Ok(resource) => responder.serve(&resource),
			Err(err) => {
				warn!(target = "tabhost.scheme", task = task.id, address = %task.address, error = %err, "scheme task failed");
				responder.fail(&err)
			}
		};
		debug!(target = "tabhost.scheme", task = task.id, outcome = ?outcome, "scheme task finished");
		outcome
	}
}

impl fmt::Debug for LocalSchemeHandler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LocalSchemeHandler")
			.field("resolver", &self.resolver)
			.field("active_tasks", &self.active_tasks())
			.finish()
	}
}

/// Sink that buffers everything it receives.
#[derive(Debug, Default)]
pub struct BufferedSink {
	state: Mutex<BufferedState>,
}

#[derive(Debug, Default, Clone)]
pub struct BufferedState {
	pub mime_type: Option<String>,
	pub expected_length: Option<usize>,
	pub body: Vec<u8>,
	pub chunks: usize,
	pub finished: bool,
	pub failure: Option<String>,
}

impl BufferedSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn snapshot(&self) -> BufferedState {
		self.state.lock().clone()
	}
}

impl SchemeTaskSink for BufferedSink {
	fn did_receive_response(&self, mime_type: &str, expected_length: usize) {
		let mut state = self.state.lock();
		state.mime_type = Some(mime_type.to_string());
		state.expected_length = Some(expected_length);
	}

	fn did_receive_data(&self, data: &[u8]) {
		let mut state = self.state.lock();
		state.body.extend_from_slice(data);
		state.chunks += 1;
	}

	fn did_finish(&self) {
		self.state.lock().finished = true;
	}

	fn did_fail(&self, error: &Error) {
		self.state.lock().failure = Some(error.to_string());
	}
}

#[cfg(test)]
mod tests {
	use std::sync::mpsc;
	use std::time::Duration;

	use tabhost_protocol::BuildMode;

	use super::*;
	use crate::resolver::MemoryAssets;

	#[derive(Default)]
	struct EventLog(Mutex<Vec<String>>);

	impl SchemeTaskSink for EventLog {
		fn did_receive_response(&self, mime_type: &str, expected_length: usize) {
			self.0.lock().push(format!("response {mime_type} {expected_length}"));
		}
		fn did_receive_data(&self, data: &[u8]) {
			self.0.lock().push(format!("data {}", data.len()));
		}
		fn did_finish(&self) {
			self.0.lock().push("finish".into());
		}
		fn did_fail(&self, error: &Error) {
			self.0.lock().push(format!("fail {}", error.code()));
		}
	}

	fn handler(assets: MemoryAssets) -> Arc<LocalSchemeHandler> {
		let resolver = ResourceResolver::new(BuildMode::Release, Arc::new(assets));
		Arc::new(LocalSchemeHandler::new(Arc::new(resolver)))
	}

	#[tokio::test]
	async fn serves_response_data_finish() {
		let handler = handler(MemoryAssets::new().with_file("app.js", "let a = 1;"));
		let log = Arc::new(EventLog::default());

		let outcome = handler
			.start(SchemeTask::new("local://app.js", log.clone()))
			.await
			.unwrap();

		assert_eq!(
			outcome,
			TaskOutcome::Served {
				mime_type: "application/javascript",
				len: 10
			}
		);
		assert_eq!(*log.0.lock(), vec!["response application/javascript 10", "data 10", "finish"]);
		assert_eq!(handler.active_tasks(), 0);
	}

	#[tokio::test]
	async fn missing_resource_fails_once() {
		let handler = handler(MemoryAssets::new());
		let log = Arc::new(EventLog::default());

		let outcome = handler
			.start(SchemeTask::new("local://gone.css", log.clone()))
			.await
			.unwrap();

		assert!(matches!(outcome, TaskOutcome::Failed { code: "RESOURCE_NOT_FOUND", .. }));
		assert_eq!(*log.0.lock(), vec!["fail RESOURCE_NOT_FOUND"]);
	}

	#[tokio::test]
	async fn large_body_is_chunked() {
		let body = vec![b'x'; DATA_CHUNK_SIZE * 2 + 10];
		let handler = handler(MemoryAssets::new().with_file("blob.bin", body.clone()));
		let sink = Arc::new(BufferedSink::new());

		handler.start(SchemeTask::new("local://blob.bin", sink.clone())).await.unwrap();

		let state = sink.snapshot();
		assert_eq!(state.chunks, 3);
		assert_eq!(state.body, body);
		assert_eq!(state.mime_type.as_deref(), Some("application/octet-stream"));
		assert!(state.finished);
	}

	#[tokio::test]
	async fn stop_before_delivery_suppresses_everything() {
		let handler = handler(MemoryAssets::new().with_file("index.html", "<html/>"));
		let log = Arc::new(EventLog::default());

		let task = SchemeTask::new("local://index.html", log.clone());
		let id = task.id();
		// The current-thread test runtime does not poll the spawned task
		// until this test yields.
		let join = handler.start(task);
		assert!(handler.stop(id));

		assert_eq!(join.await.unwrap(), TaskOutcome::Cancelled);
		assert!(log.0.lock().is_empty());
		assert_eq!(handler.active_tasks(), 0);
	}

	#[tokio::test]
	async fn stop_unknown_task_is_noop() {
		let handler = handler(MemoryAssets::new());
		assert!(!handler.stop(9_999_999));
	}

	#[tokio::test]
	async fn stop_after_finish_reports_false() {
		let handler = handler(MemoryAssets::new().with_file("a.txt", "a"));
		let task = SchemeTask::new("local://a.txt", Arc::new(BufferedSink::new()));
		let id = task.id();

		handler.start(task).await.unwrap();
		assert!(!handler.stop(id));
	}

	#[test]
	fn responder_checks_stop_before_failing() {
		let log = Arc::new(EventLog::default());
		let stop = Arc::new(StopSignal::new());
		stop.stop();

		let responder = TaskResponder {
			sink: log.clone(),
			stop,
		};
		let outcome = responder.fail(&Error::ResourceNotFound {
			filename: "x".into(),
		});

		assert_eq!(outcome, TaskOutcome::Cancelled);
		assert!(log.0.lock().is_empty());
	}

	/// Stops its own task from inside the first data callback.
	#[derive(Default)]
	struct SelfStoppingSink {
		log: EventLog,
		target: Mutex<Option<(Arc<LocalSchemeHandler>, TaskId)>>,
		stop_result: Mutex<Option<bool>>,
	}

	impl SchemeTaskSink for SelfStoppingSink {
		fn did_receive_response(&self, mime_type: &str, expected_length: usize) {
			self.log.did_receive_response(mime_type, expected_length);
		}
		fn did_receive_data(&self, data: &[u8]) {
			self.log.did_receive_data(data);
			let target = self.target.lock().take();
			if let Some((handler, id)) = target {
				*self.stop_result.lock() = Some(handler.stop(id));
			}
		}
		fn did_finish(&self) {
			self.log.did_finish();
		}
		fn did_fail(&self, error: &Error) {
			self.log.did_fail(error);
		}
	}

	#[tokio::test]
	async fn sink_can_stop_its_own_task() {
		let body = vec![b'z'; DATA_CHUNK_SIZE * 3];
		let handler = handler(MemoryAssets::new().with_file("big.bin", body));
		let sink = Arc::new(SelfStoppingSink::default());

		let task = SchemeTask::new("local://big.bin", sink.clone());
		*sink.target.lock() = Some((Arc::clone(&handler), task.id()));

		let outcome = handler.start(task).await.unwrap();

		assert_eq!(outcome, TaskOutcome::Cancelled);
		assert_eq!(*sink.stop_result.lock(), Some(true));
		assert_eq!(
			*sink.log.0.lock(),
			vec![format!("response application/octet-stream {}", DATA_CHUNK_SIZE * 3), format!("data {DATA_CHUNK_SIZE}")]
		);
	}

	/// Holds the first data chunk open until another thread has been told
	/// to stop the task.
	struct SlowSink {
		events: Arc<Mutex<Vec<&'static str>>>,
		entered: Mutex<Option<mpsc::Sender<()>>>,
	}

	impl SchemeTaskSink for SlowSink {
		fn did_receive_response(&self, _mime_type: &str, _expected_length: usize) {
			self.events.lock().push("response");
		}
		fn did_receive_data(&self, _data: &[u8]) {
			let entered = self.entered.lock().take();
			match entered {
				Some(tx) => {
					tx.send(()).unwrap();
					std::thread::sleep(Duration::from_millis(50));
					self.events.lock().push("first chunk done");
				}
				None => {
					std::thread::sleep(Duration::from_millis(2));
					self.events.lock().push("data");
				}
			}
		}
		fn did_finish(&self) {
			self.events.lock().push("finish");
		}
		fn did_fail(&self, _error: &Error) {
			self.events.lock().push("fail");
		}
	}

	#[test]
	fn stop_from_another_thread_waits_for_the_step_in_flight() {
		let events = Arc::new(Mutex::new(Vec::new()));
		let (entered_tx, entered_rx) = mpsc::channel();
		let stop = Arc::new(StopSignal::new());
		let responder = TaskResponder {
			sink: Arc::new(SlowSink {
				events: Arc::clone(&events),
				entered: Mutex::new(Some(entered_tx)),
			}),
			stop: Arc::clone(&stop),
		};
		let resource = ResolvedResource {
			file_name: "big.bin".into(),
			base: "big".into(),
			extension: Some("bin".into()),
			mime_type: "application/octet-stream",
			bytes: vec![0; DATA_CHUNK_SIZE * 8],
		};

		let stopper = {
			let events = Arc::clone(&events);
			std::thread::spawn(move || {
				entered_rx.recv().unwrap();
				let stopped = stop.stop();
				events.lock().push("stopped");
				stopped
			})
		};
		let outcome = responder.serve(&resource);
		let stopped = stopper.join().unwrap();

		let events = events.lock();
		let position = |name| events.iter().position(|e| *e == name).unwrap();
		assert!(position("first chunk done") < position("stopped"));
		if stopped {
			assert_eq!(outcome, TaskOutcome::Cancelled);
			assert_eq!(events.last(), Some(&"stopped"));
			assert!(!events.contains(&"finish"));
		} else {
			assert!(matches!(outcome, TaskOutcome::Served { .. }));
			assert!(position("finish") < position("stopped"));
		}
	}

	#[test]
	fn stop_after_terminal_step_reports_false() {
		let stop = StopSignal::new();
		assert!(stop.deliver(true, || {}));
		assert!(!stop.stop());
		assert!(!stop.is_stopped());
	}

	#[tokio::test]
	async fn stop_signal_wakes_waiter() {
		let signal = Arc::new(StopSignal::new());
		let waiter = {
			let signal = Arc::clone(&signal);
			tokio::spawn(async move { signal.stopped().await })
		};

		tokio::task::yield_now().await;
		signal.stop();
		waiter.await.unwrap();
		assert!(signal.is_stopped());
	}
}
