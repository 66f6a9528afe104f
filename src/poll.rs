//! The status-polling state machine.
//!
//! One machine serves both execution modes. [`PollMachine`] is pure: it does
//! no I/O and never reads a clock. The driver owns the suspension primitive
//! (`tokio::time::sleep` in [`crate::client`], `std::thread::sleep` in
//! [`crate::blocking`]) and feeds the machine two things:
//!
//! 1. the elapsed wall-clock time before each status query
//!    ([`PollMachine::query_allowed`]), and
//! 2. the observed task state after each query ([`PollMachine::observe`]).
//!
//! The machine decides everything else: whether to fetch the result, fail,
//! or wait the fixed interval and query again. Because both drivers run the
//! same transitions, a scripted backend produces identical outcomes under
//! either mode.
//!
//! The interval is fixed. No backoff, no jitter: query times for a given
//! status script are reproducible, which the timing tests rely on.

use crate::protocol::TaskState;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// States of a polling session.
///
/// `Polling` is the only non-terminal state. Once the machine reaches
/// `Completed`, `Failed`, or `TimedOut` it permits no further queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Completed,
    Failed,
    TimedOut,
}

impl PollState {
    pub fn is_terminal(self) -> bool {
        self != PollState::Polling
    }
}

/// What the driver must do next after a status observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// The task completed: fetch the result envelope, exactly once.
    FetchResult,
    /// The task failed on the server: report it, issue no further queries.
    Fail,
    /// Still in flight: suspend for the fixed interval, then re-check the
    /// elapsed-time guard and query again.
    Wait(Duration),
}

/// Timing budget and progress hook for a polling session.
#[derive(Clone)]
pub struct PollOptions {
    /// Total budget for the session. Default: 300 s.
    pub timeout: Duration,
    /// Fixed wait between status queries. Default: 2 s.
    pub interval: Duration,
    /// Optional per-query progress hook.
    pub observer: Option<Arc<dyn PollObserver>>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            interval: Duration::from_secs(2),
            observer: None,
        }
    }
}

impl fmt::Debug for PollOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollOptions")
            .field("timeout", &self.timeout)
            .field("interval", &self.interval)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn PollObserver>"))
            .finish()
    }
}

impl PollOptions {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            observer: None,
        }
    }

    /// Convenience for CLI-style whole-second budgets.
    pub fn from_secs(timeout_secs: u64, interval_secs: u64) -> Self {
        Self::new(
            Duration::from_secs(timeout_secs),
            Duration::from_secs(interval_secs),
        )
    }

    pub fn with_observer(mut self, observer: Arc<dyn PollObserver>) -> Self {
        self.observer = Some(observer);
        self
    }
}

/// Receives one event per status query while a task is being awaited.
///
/// Implementations must be `Send + Sync`; a batch of jobs may poll
/// concurrently and share one observer. The default method is a no-op so
/// callers only implement what they need (a progress spinner, a log line,
/// a test recorder).
pub trait PollObserver: Send + Sync {
    /// Called after each status query, with the state the server reported
    /// and the wall-clock time elapsed since polling began.
    fn on_status(&self, task_id: &str, state: TaskState, elapsed: Duration) {
        let _ = (task_id, state, elapsed);
    }
}

/// A no-op observer for callers that don't track progress.
pub struct NoopObserver;

impl PollObserver for NoopObserver {}

/// The polling state machine for one task.
///
/// Drivers use it in a strict loop shape:
///
/// ```text
/// while machine.query_allowed(elapsed):
///     state = GET /tasks/{id}
///     match machine.observe(state):
///         FetchResult -> GET /tasks/{id}/result, done
///         Fail        -> error, done
///         Wait(d)     -> suspend d, continue
/// else: timed out
/// ```
#[derive(Debug)]
pub struct PollMachine {
    timeout: Duration,
    interval: Duration,
    state: PollState,
}

impl PollMachine {
    pub fn new(options: &PollOptions) -> Self {
        Self {
            timeout: options.timeout,
            interval: options.interval,
            state: PollState::Polling,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// The elapsed-time guard, checked before every status query.
    ///
    /// Returns `false` once `elapsed` reaches the timeout budget (the machine
    /// transitions to [`PollState::TimedOut`]) or after any terminal state.
    pub fn query_allowed(&mut self, elapsed: Duration) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        if elapsed >= self.timeout {
            self.state = PollState::TimedOut;
            return false;
        }
        true
    }

    /// Feed one observed task state; returns the driver's next step.
    ///
    /// Must only be called while `state()` is [`PollState::Polling`], i.e.
    /// directly after `query_allowed` returned `true`.
    pub fn observe(&mut self, observed: TaskState) -> PollStep {
        debug_assert_eq!(
            self.state,
            PollState::Polling,
            "observe() called after a terminal state"
        );
        match observed {
            TaskState::Completed => {
                self.state = PollState::Completed;
                PollStep::FetchResult
            }
            TaskState::Failed => {
                self.state = PollState::Failed;
                PollStep::Fail
            }
            // pending, running, unknown: still in flight.
            _ => PollStep::Wait(self.interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run a status script through the machine with a simulated clock that
    /// advances by `interval` on every `Wait`. Returns the number of queries
    /// issued and the final state.
    fn run_script(script: &[TaskState], options: &PollOptions) -> (usize, PollState) {
        let mut machine = PollMachine::new(options);
        let mut elapsed = Duration::ZERO;
        let mut queries = 0usize;
        let mut script = script.iter();

        while machine.query_allowed(elapsed) {
            // A scripted state must exist for every allowed query; running
            // dry here would mean the machine over-queried.
            let state = *script.next().expect("machine queried past the script");
            queries += 1;
            match machine.observe(state) {
                PollStep::FetchResult | PollStep::Fail => break,
                PollStep::Wait(d) => elapsed += d,
            }
        }
        (queries, machine.state())
    }

    #[test]
    fn pending_pending_completed_queries_exactly_three_times() {
        let opts = PollOptions::from_secs(300, 2);
        let script = [TaskState::Pending, TaskState::Pending, TaskState::Completed];
        let (queries, state) = run_script(&script, &opts);
        assert_eq!(queries, 3);
        assert_eq!(state, PollState::Completed);
    }

    #[test]
    fn failed_on_first_query_stops_immediately() {
        let opts = PollOptions::from_secs(300, 2);
        let (queries, state) = run_script(&[TaskState::Failed], &opts);
        assert_eq!(queries, 1);
        assert_eq!(state, PollState::Failed);
    }

    #[test]
    fn never_terminal_times_out_after_budget() {
        // timeout 5 s, interval 2 s: queries at elapsed 0, 2, 4, then the
        // guard fails at 6 and the session times out.
        let opts = PollOptions::from_secs(5, 2);
        let script = [TaskState::Pending; 8];
        let (queries, state) = run_script(&script, &opts);
        assert_eq!(queries, 3);
        assert_eq!(state, PollState::TimedOut);
    }

    #[test]
    fn unknown_states_keep_polling() {
        let opts = PollOptions::from_secs(300, 2);
        let script = [
            TaskState::Unknown,
            TaskState::Running,
            TaskState::Unknown,
            TaskState::Completed,
        ];
        let (queries, state) = run_script(&script, &opts);
        assert_eq!(queries, 4);
        assert_eq!(state, PollState::Completed);
    }

    #[test]
    fn no_query_is_allowed_after_a_terminal_state() {
        let opts = PollOptions::from_secs(300, 2);
        let mut machine = PollMachine::new(&opts);
        assert!(machine.query_allowed(Duration::ZERO));
        assert_eq!(machine.observe(TaskState::Completed), PollStep::FetchResult);
        assert!(machine.state().is_terminal());
        assert!(!machine.query_allowed(Duration::from_secs(1)));
    }

    #[test]
    fn guard_boundary_is_inclusive() {
        let opts = PollOptions::from_secs(5, 2);
        let mut machine = PollMachine::new(&opts);
        assert!(machine.query_allowed(Duration::from_millis(4999)));
        assert_eq!(machine.observe(TaskState::Pending), PollStep::Wait(Duration::from_secs(2)));
        assert!(!machine.query_allowed(Duration::from_secs(5)));
        assert_eq!(machine.state(), PollState::TimedOut);
    }

    #[test]
    fn wait_step_carries_the_fixed_interval() {
        let opts = PollOptions::from_secs(60, 7);
        let mut machine = PollMachine::new(&opts);
        assert!(machine.query_allowed(Duration::ZERO));
        assert_eq!(
            machine.observe(TaskState::Running),
            PollStep::Wait(Duration::from_secs(7))
        );
    }
}
