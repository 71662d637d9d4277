// Worker
// Single-slot task execution unit running on its own thread, tracking busy/idle time and fatigue

use crate::error::{EngineError, EngineResult};

use crossbeam_channel::{select, Receiver, Sender, TryRecvError, TrySendError};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Unit of work executed by a worker
pub type Task = Box<dyn FnOnce() -> EngineResult<()> + Send + 'static>;

/// Callback invoked with the task outcome after the worker has updated its counters
pub type Completion = Box<dyn FnOnce(EngineResult<()>) + Send + 'static>;

/// A task together with its completion hook
pub struct Assignment {
    task: Task,
    on_complete: Option<Completion>,
}

impl Assignment {
    pub fn new<F>(task: F) -> Self
    where
        F: FnOnce() -> EngineResult<()> + Send + 'static,
    {
        Self {
            task: Box::new(task),
            on_complete: None,
        }
    }

    /// Run `hook` with the task's result on every exit path, including panics
    pub fn on_complete<C>(mut self, hook: C) -> Self
    where
        C: FnOnce(EngineResult<()>) + Send + 'static,
    {
        self.on_complete = Some(Box::new(hook));
        self
    }
}

/// Lifecycle state of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Terminated,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Idle,
            1 => WorkerState::Running,
            _ => WorkerState::Terminated,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            WorkerState::Idle => 0,
            WorkerState::Running => 1,
            WorkerState::Terminated => 2,
        }
    }
}

/// Counters shared between the worker handle and its thread
#[derive(Debug)]
struct WorkerCore {
    id: usize,
    factor: f64,
    state: AtomicU8,
    busy_nanos: AtomicU64,
    idle_nanos: AtomicU64,
    tasks_completed: AtomicU64,
}

impl WorkerCore {
    fn set_state(&self, state: WorkerState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    fn add_idle(&self, elapsed: Duration) {
        self.idle_nanos
            .fetch_add(duration_nanos(elapsed), Ordering::Relaxed);
    }

    fn execute(&self, assignment: Assignment) {
        let Assignment { task, on_complete } = assignment;

        self.set_state(WorkerState::Running);
        trace!(worker = self.id, "task started");
        let started = Instant::now();

        let result = match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(result) => result,
            Err(payload) => Err(EngineError::TaskPanicked(panic_message(payload.as_ref()))),
        };

        self.busy_nanos
            .fetch_add(duration_nanos(started.elapsed()), Ordering::AcqRel);
        self.tasks_completed.fetch_add(1, Ordering::AcqRel);
        self.set_state(WorkerState::Idle);
        trace!(worker = self.id, ok = result.is_ok(), "task finished");

        match on_complete {
            Some(hook) => hook(result),
            None => {
                if let Err(err) = result {
                    warn!(worker = self.id, error = %err, "task failed with no completion hook");
                }
            }
        }
    }
}

enum Next {
    Run(Assignment),
    DrainAndStop(Assignment),
    Stop,
}

fn run_loop(core: Arc<WorkerCore>, tasks: Receiver<Assignment>, shutdown: Receiver<()>) {
    let mut idle_since = Instant::now();

    loop {
        let next = select! {
            recv(tasks) -> msg => match msg {
                Ok(assignment) => Next::Run(assignment),
                Err(_) => Next::Stop,
            },
            recv(shutdown) -> _ => match tasks.try_recv() {
                Ok(assignment) => Next::DrainAndStop(assignment),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Next::Stop,
            },
        };
        core.add_idle(idle_since.elapsed());

        match next {
            Next::Run(assignment) => core.execute(assignment),
            Next::DrainAndStop(assignment) => {
                core.execute(assignment);
                break;
            }
            Next::Stop => break,
        }
        idle_since = Instant::now();
    }

    core.set_state(WorkerState::Terminated);
    trace!(worker = core.id, "worker terminated");
}

/// Handle to a worker thread with a single-slot mailbox
#[derive(Debug)]
pub struct Worker {
    core: Arc<WorkerCore>,
    mailbox: Sender<Assignment>,
    shutdown: Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    /// Start a worker thread with the given fatigue factor
    pub fn spawn(id: usize, factor: f64) -> EngineResult<Self> {
        let core = Arc::new(WorkerCore {
            id,
            factor,
            state: AtomicU8::new(WorkerState::Idle.as_u8()),
            busy_nanos: AtomicU64::new(0),
            idle_nanos: AtomicU64::new(0),
            tasks_completed: AtomicU64::new(0),
        });

        let (mailbox, tasks) = crossbeam_channel::bounded(1);
        let (shutdown, shutdown_rx) = crossbeam_channel::bounded(1);

        let thread_core = Arc::clone(&core);
        let handle = thread::Builder::new()
            .name(format!("lae-worker-{}", id))
            .spawn(move || run_loop(thread_core, tasks, shutdown_rx))
            .map_err(|e| {
                EngineError::interrupted(format!("failed to spawn worker {}: {}", id, e))
            })?;

        Ok(Self {
            core,
            mailbox,
            shutdown,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn id(&self) -> usize {
        self.core.id
    }

    pub fn factor(&self) -> f64 {
        self.core.factor
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.core.state.load(Ordering::Acquire))
    }

    pub fn is_busy(&self) -> bool {
        self.state() == WorkerState::Running
    }

    pub fn busy_time(&self) -> Duration {
        Duration::from_nanos(self.core.busy_nanos.load(Ordering::Acquire))
    }

    pub fn idle_time(&self) -> Duration {
        Duration::from_nanos(self.core.idle_nanos.load(Ordering::Relaxed))
    }

    pub fn tasks_completed(&self) -> u64 {
        self.core.tasks_completed.load(Ordering::Acquire)
    }

    /// `factor × cumulative busy nanoseconds`; lower is preferred
    pub fn fatigue(&self) -> f64 {
        self.core.factor * self.core.busy_nanos.load(Ordering::Acquire) as f64
    }

    /// Put an assignment in the mailbox.
    ///
    /// Callers only deliver to a worker they have just taken out of the idle
    /// set, so a full mailbox is a protocol violation rather than backpressure.
    pub fn deliver(&self, assignment: Assignment) -> EngineResult<()> {
        match self.mailbox.try_send(assignment) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(EngineError::misuse(format!(
                "worker {} already has an undelivered task",
                self.id()
            ))),
            Err(TrySendError::Disconnected(_)) => Err(EngineError::interrupted(format!(
                "worker {} has terminated",
                self.id()
            ))),
        }
    }

    /// Signal termination. An in-progress task is not preempted.
    pub fn terminate(&self) {
        // Full means the signal is already pending
        let _ = self.shutdown.try_send(());
    }

    /// Wait for the worker thread to exit. Later calls return immediately.
    pub fn join(&self) -> EngineResult<()> {
        let handle = self.handle.lock().take();
        match handle {
            Some(handle) => handle.join().map_err(|payload| {
                EngineError::interrupted(format!(
                    "worker {} thread panicked: {}",
                    self.id(),
                    panic_message(payload.as_ref())
                ))
            }),
            None => Ok(()),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
