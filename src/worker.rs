use crate::levels::Level;
use crate::solver::{Report, Solver};
use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

/// Runs solves on background threads. Every launch or cancel bumps the
/// current run id; a finished solve whose id is no longer current is
/// dropped instead of delivered. Running searches are never interrupted.
#[derive(Debug, Default)]
pub struct Worker {
    current_run: Arc<AtomicU64>,
}

/// Handle to one launched solve.
pub struct Ticket {
    run_id: u64,
    current_run: Arc<AtomicU64>,
    receiver: Receiver<(u64, Report)>,
}

impl Worker {
    pub fn new() -> Self {
        Worker::default()
    }

    pub fn launch(&self, solver: Solver, level: Level) -> Ticket {
        let run_id = self.current_run.fetch_add(1, Ordering::SeqCst) + 1;
        let (sender, receiver) = mpsc::channel();

        debug!("launching run {} with {}", run_id, solver.strategy());
        thread::spawn(move || {
            let report = solver.solve(&level);
            debug!("run {} finished, solved: {}", run_id, report.is_solved());
            // The ticket may already be gone.
            let _ = sender.send((run_id, report));
        });

        Ticket {
            run_id,
            current_run: Arc::clone(&self.current_run),
            receiver,
        }
    }

    /// Mark whatever is running as stale.
    pub fn cancel(&self) {
        let stale = self.current_run.fetch_add(1, Ordering::SeqCst);
        debug!("run {} cancelled", stale);
    }
}

impl Ticket {
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    pub fn is_stale(&self) -> bool {
        self.current_run.load(Ordering::SeqCst) != self.run_id
    }

    /// Block until the solve finishes or `timeout` passes. Returns None on
    /// timeout, or when the run went stale before its result arrived.
    pub fn wait(&self, timeout: Option<Duration>) -> Option<Report> {
        let (run_id, report) = match timeout {
            Some(timeout) => self.receiver.recv_timeout(timeout).ok()?,
            None => self.receiver.recv().ok()?,
        };

        if run_id != self.run_id || self.is_stale() {
            debug!("discarding stale result of run {}", run_id);
            return None;
        }
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Direction;
    use crate::solver::SolveOptions;
    use crate::strategy::Strategy;

    fn corridor() -> Level {
        Level::from_grid_text("6 3\n1 1\nwwwwww\nw.c.tw\nwwwwww\n").unwrap()
    }

    fn solver() -> Solver {
        Solver::new(Strategy::BreadthFirstTree, SolveOptions::default())
    }

    #[test]
    fn test_result_delivered() {
        let worker = Worker::new();
        let ticket = worker.launch(solver(), corridor());

        assert_eq!(ticket.run_id(), 1);
        assert!(!ticket.is_stale());
        let report = ticket.wait(None).unwrap();
        assert_eq!(
            report.moves(),
            Some(&[Direction::Right, Direction::Right][..])
        );
    }

    #[test]
    fn test_cancelled_result_discarded() {
        let worker = Worker::new();
        let ticket = worker.launch(solver(), corridor());
        worker.cancel();

        assert!(ticket.is_stale());
        assert!(ticket.wait(None).is_none());
    }

    #[test]
    fn test_newer_launch_supersedes() {
        let worker = Worker::new();
        let first = worker.launch(solver(), corridor());
        let second = worker.launch(solver(), corridor());

        assert_eq!(second.run_id(), first.run_id() + 1);
        assert!(!second.is_stale());
        assert!(first.is_stale());
        assert!(first.wait(None).is_none());
        assert!(second.wait(Some(Duration::from_secs(30))).is_some());
    }
}
