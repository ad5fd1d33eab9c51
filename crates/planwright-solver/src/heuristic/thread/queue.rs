//! Result queue that hands move results back in move index order.
//!
//! Move threads finish evaluations in any order. The coordinator must
//! forage them in the order the moves were selected, or the picked move
//! would depend on thread scheduling. [`OrderByMoveIndexQueue::take`]
//! parks early arrivals in a backlog until their turn comes, and silently
//! drops results left over from a previous step.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use planwright_core::{PlanningSolution, Result, SolverError};

/// How long `take` blocks before it re-checks the interrupt flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The outcome of evaluating one move on a move thread.
pub struct ThreadResult<S: PlanningSolution, M> {
    pub thread_index: usize,
    pub step_index: u64,
    pub move_index: usize,
    pub mv: M,
    /// `None` when the move was not doable on the move thread.
    pub score: Option<S::Score>,
}

impl<S: PlanningSolution, M> ThreadResult<S, M> {
    pub fn is_doable(&self) -> bool {
        self.score.is_some()
    }
}

impl<S: PlanningSolution, M: fmt::Debug> fmt::Debug for ThreadResult<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadResult")
            .field("thread_index", &self.thread_index)
            .field("step_index", &self.step_index)
            .field("move_index", &self.move_index)
            .field("mv", &self.mv)
            .field("score", &self.score)
            .finish()
    }
}

enum Message<S: PlanningSolution, M> {
    Result(ThreadResult<S, M>),
    Error(SolverError),
}

/// The producer side of an [`OrderByMoveIndexQueue`], one per move thread.
///
/// Sends fail silently once the coordinator has dropped the queue.
pub struct ResultSender<S: PlanningSolution, M> {
    sender: Sender<Message<S, M>>,
}

impl<S: PlanningSolution, M> Clone for ResultSender<S, M> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<S: PlanningSolution, M> ResultSender<S, M> {
    pub fn add_move(
        &self,
        thread_index: usize,
        step_index: u64,
        move_index: usize,
        mv: M,
        score: S::Score,
    ) {
        let _ = self.sender.send(Message::Result(ThreadResult {
            thread_index,
            step_index,
            move_index,
            mv,
            score: Some(score),
        }));
    }

    pub fn add_undoable_move(&self, thread_index: usize, step_index: u64, move_index: usize, mv: M) {
        let _ = self.sender.send(Message::Result(ThreadResult {
            thread_index,
            step_index,
            move_index,
            mv,
            score: None,
        }));
    }

    /// Reports a failure; the next `take` on the coordinator returns it.
    pub fn add_error(&self, error: SolverError) {
        let _ = self.sender.send(Message::Error(error));
    }
}

/// A bounded queue of move results, taken in move index order.
///
/// # Example
///
/// ```
/// use std::sync::atomic::AtomicBool;
/// use planwright_core::SimpleScore;
/// use planwright_solver::heuristic::OrderByMoveIndexQueue;
/// use planwright_test::doubling::DoublingSolution;
///
/// let mut queue = OrderByMoveIndexQueue::<DoublingSolution, &str>::new(4);
/// let sender = queue.sender();
/// queue.start_next_step(0);
/// sender.add_move(1, 0, 1, "second", SimpleScore::of(-1));
/// sender.add_move(0, 0, 0, "first", SimpleScore::of(0));
///
/// let interrupted = AtomicBool::new(false);
/// assert_eq!(queue.take(&interrupted).unwrap().mv, "first");
/// assert_eq!(queue.take(&interrupted).unwrap().mv, "second");
/// ```
pub struct OrderByMoveIndexQueue<S: PlanningSolution, M> {
    sender: Sender<Message<S, M>>,
    receiver: Receiver<Message<S, M>>,
    filter_step_index: Option<u64>,
    next_move_index: usize,
    backlog: HashMap<usize, ThreadResult<S, M>>,
}

impl<S: PlanningSolution, M> OrderByMoveIndexQueue<S, M> {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = channel::bounded(capacity);
        Self {
            sender,
            receiver,
            filter_step_index: None,
            next_move_index: 0,
            backlog: HashMap::new(),
        }
    }

    pub fn sender(&self) -> ResultSender<S, M> {
        ResultSender {
            sender: self.sender.clone(),
        }
    }

    /// Starts accepting results of `step_index` only, beginning at move 0.
    pub fn start_next_step(&mut self, step_index: u64) {
        self.filter_step_index = Some(step_index);
        self.next_move_index = 0;
        self.backlog.clear();
    }

    /// Blocks until the result of the next move index arrives.
    ///
    /// A move thread error is returned as is, whatever step it belongs to.
    /// Fails with [`SolverError::Interrupted`] when `interrupted` is raised
    /// while no result is coming in.
    pub fn take(&mut self, interrupted: &AtomicBool) -> Result<ThreadResult<S, M>> {
        let step_index = self.filter_step_index.ok_or_else(|| {
            SolverError::InvalidState("result queue taken before the first step started".to_string())
        })?;
        let move_index = self.next_move_index;
        self.next_move_index += 1;
        if let Some(result) = self.backlog.remove(&move_index) {
            return Ok(result);
        }
        loop {
            match self.receiver.recv_timeout(POLL_INTERVAL) {
                Ok(Message::Error(error)) => return Err(error),
                Ok(Message::Result(result)) => {
                    if result.step_index != step_index {
                        // Left over from a step that quit early.
                        continue;
                    }
                    if result.move_index == move_index {
                        return Ok(result);
                    }
                    self.backlog.insert(result.move_index, result);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if interrupted.load(Ordering::Acquire) {
                        return Err(SolverError::Interrupted(format!(
                            "waiting for move {} of step {}",
                            move_index, step_index
                        )));
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(SolverError::InvalidState(
                        "result queue disconnected".to_string(),
                    ));
                }
            }
        }
    }
}

impl<S: PlanningSolution, M> fmt::Debug for OrderByMoveIndexQueue<S, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderByMoveIndexQueue")
            .field("filter_step_index", &self.filter_step_index)
            .field("next_move_index", &self.next_move_index)
            .field("backlog", &self.backlog.len())
            .field("pending", &self.receiver.len())
            .finish()
    }
}
