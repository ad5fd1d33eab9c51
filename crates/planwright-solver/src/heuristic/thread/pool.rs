//! A fixed set of move threads sharing one operation queue.

use std::fmt;
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use planwright_core::{PlanningSolution, Result, SolverError};
use planwright_scoring::ScoreDirector;
use tracing::{debug, warn};

use super::{MoveThreadOperation, MoveThreadRunner, OrderByMoveIndexQueue};
use crate::heuristic::r#move::{EvaluationAsserts, Move};

/// How long shutdown waits for move threads before detaching them.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Move threads plus the queues connecting them to the coordinator.
///
/// Dropping a pool that was not shut down posts `Destroy` without
/// blocking, so an error on the coordinator never strands its threads.
pub struct MoveThreadPool<S: PlanningSolution, M> {
    operations: Sender<MoveThreadOperation<S, M>>,
    pending: Receiver<MoveThreadOperation<S, M>>,
    results: Option<OrderByMoveIndexQueue<S, M>>,
    done: Receiver<u64>,
    handles: Vec<JoinHandle<()>>,
    destroyed: bool,
}

impl<S, M> MoveThreadPool<S, M>
where
    S: PlanningSolution,
    M: Move<S>,
{
    /// Starts `thread_count` move threads, each on a child of `parent`.
    ///
    /// The operation queue holds `buffer_size + 2 * thread_count` entries,
    /// the result queue `buffer_size + thread_count`.
    pub fn start<D>(
        parent: &D,
        thread_count: usize,
        buffer_size: usize,
        asserts: EvaluationAsserts,
    ) -> Result<Self>
    where
        D: ScoreDirector<S> + 'static,
    {
        let (operations, pending) = channel::bounded(buffer_size + 2 * thread_count);
        let results = OrderByMoveIndexQueue::new(buffer_size + thread_count);
        let (done_sender, done) = channel::bounded(thread_count);
        let barrier = Arc::new(Barrier::new(thread_count));

        let mut pool = Self {
            operations,
            pending,
            results: None,
            done,
            handles: Vec::with_capacity(thread_count),
            destroyed: false,
        };
        for thread_index in 0..thread_count {
            let runner = MoveThreadRunner::new(
                thread_index,
                parent.create_child_thread_director()?,
                pool.pending.clone(),
                results.sender(),
                Arc::clone(&barrier),
                asserts,
            );
            let done_sender = done_sender.clone();
            let handle = thread::Builder::new()
                .name(format!("planwright-move-thread-{}", thread_index))
                .spawn(move || {
                    let calculation_count = runner.run();
                    let _ = done_sender.send(calculation_count);
                })
                .map_err(|e| SolverError::WorkerFailed {
                    thread: thread_index,
                    message: e.to_string(),
                })?;
            pool.handles.push(handle);
        }
        pool.results = Some(results);
        debug!(event = "move_threads_started", threads = thread_count, buffer_size);
        Ok(pool)
    }

    pub fn thread_count(&self) -> usize {
        self.handles.len()
    }

    pub fn results(&mut self) -> Result<&mut OrderByMoveIndexQueue<S, M>> {
        self.results
            .as_mut()
            .ok_or_else(|| SolverError::InvalidState("move threads are shut down".to_string()))
    }

    pub fn evaluate(&self, step_index: u64, move_index: usize, mv: M) -> Result<()> {
        self.send(MoveThreadOperation::Evaluate {
            step_index,
            move_index,
            mv,
        })
    }

    /// Posts one `ApplyStep` per move thread.
    pub fn apply_step(&self, step_index: u64, mv: &M, score: S::Score) -> Result<()> {
        for _ in 0..self.handles.len() {
            self.send(MoveThreadOperation::ApplyStep {
                step_index,
                mv: mv.clone(),
                score,
            })?;
        }
        Ok(())
    }

    /// Drops evaluations no move thread has taken yet.
    pub fn clear_pending(&self) {
        while self.pending.try_recv().is_ok() {}
    }

    /// Stops every move thread and returns their summed calculation count.
    ///
    /// Threads that do not stop within a second are detached with a warning.
    pub fn shutdown(&mut self) -> u64 {
        self.destroyed = true;
        for _ in 0..self.handles.len() {
            let _ = self.operations.send(MoveThreadOperation::Destroy);
        }
        // Unblocks threads stuck sending into a full result queue.
        self.results = None;

        let deadline = Instant::now() + SHUTDOWN_TIMEOUT;
        let mut calculation_count = 0;
        let mut stopped = 0;
        while stopped < self.handles.len() {
            match self.done.recv_deadline(deadline) {
                Ok(count) => {
                    calculation_count += count;
                    stopped += 1;
                }
                Err(_) => break,
            }
        }

        if stopped == self.handles.len() {
            for handle in self.handles.drain(..) {
                if handle.join().is_err() {
                    warn!(event = "move_thread_panicked");
                }
            }
        } else {
            warn!(
                event = "move_threads_not_stopped",
                threads = self.handles.len(),
                stopped,
            );
            self.handles.clear();
        }
        calculation_count
    }

    fn send(&self, operation: MoveThreadOperation<S, M>) -> Result<()> {
        self.operations
            .send(operation)
            .map_err(|_| SolverError::InvalidState("operation queue disconnected".to_string()))
    }
}

impl<S: PlanningSolution, M> Drop for MoveThreadPool<S, M> {
    fn drop(&mut self) {
        if !self.destroyed {
            for _ in 0..self.handles.len() {
                let _ = self.operations.try_send(MoveThreadOperation::Destroy);
            }
        }
    }
}

impl<S: PlanningSolution, M> fmt::Debug for MoveThreadPool<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MoveThreadPool")
            .field("threads", &self.handles.len())
            .field("pending", &self.pending.len())
            .field("destroyed", &self.destroyed)
            .finish()
    }
}
