//! Job queues for pre- and post-flush watcher deliveries.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::{deliver, dispose, take_pending_error, FlushMode, WatcherState};
use crate::config;
use crate::error::{HandlerError, OptionsError, Origin};

/// Upper bound on deliveries in one flush, guarding against watchers that
/// keep re-triggering each other.
const MAX_FLUSH_JOBS: usize = 10_000;

thread_local! {
    static PRE_QUEUE: RefCell<VecDeque<Rc<WatcherState>>> = RefCell::new(VecDeque::new());
    static POST_QUEUE: RefCell<VecDeque<Rc<WatcherState>>> = RefCell::new(VecDeque::new());
}

/// Outcome of one [`flush_watchers`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    /// Callbacks actually invoked (including failed ones).
    pub invoked: usize,
    /// Getter and callback failures, in delivery order. Each was also passed
    /// to `report_error`.
    pub errors: Vec<HandlerError>,
}

pub(crate) fn queue_job(job: Rc<WatcherState>, mode: FlushMode) {
    match mode {
        FlushMode::Post => POST_QUEUE.with(|q| q.borrow_mut().push_back(job)),
        _ => PRE_QUEUE.with(|q| q.borrow_mut().push_back(job)),
    }
}

fn next_job() -> Option<Rc<WatcherState>> {
    PRE_QUEUE
        .with(|q| q.borrow_mut().pop_front())
        .or_else(|| POST_QUEUE.with(|q| q.borrow_mut().pop_front()))
}

/// Deliver every queued watcher callback: all pre jobs first, then post jobs.
///
/// Jobs queued by callbacks during the flush run in the same flush.
pub fn flush_watchers() -> FlushReport {
    let mut report = FlushReport::default();
    let mut processed = 0;

    while let Some(job) = next_job() {
        processed += 1;
        if processed > MAX_FLUSH_JOBS {
            tracing::warn!(limit = MAX_FLUSH_JOBS, "watcher flush limit reached, dropping remaining jobs");
            reset_scheduler();
            break;
        }

        if let Some(err) = take_pending_error(&job) {
            config::report_error(&OptionsError::handler(Origin::Scheduler, err.clone()));
            report.errors.push(err);
        }

        match deliver(&job, true) {
            Ok(true) => report.invoked += 1,
            Ok(false) => {}
            Err(err) => {
                report.invoked += 1;
                config::report_error(&OptionsError::handler(Origin::Scheduler, err.clone()));
                report.errors.push(err);
            }
        }
    }

    if report.invoked > 0 {
        tracing::trace!(invoked = report.invoked, failed = report.errors.len(), "watchers flushed");
    }
    report
}

/// Number of deliveries waiting for a flush.
pub fn pending_jobs() -> usize {
    PRE_QUEUE.with(|q| q.borrow().len()) + POST_QUEUE.with(|q| q.borrow().len())
}

/// Drop every queued delivery (for testing).
pub fn reset_scheduler() {
    let dropped: Vec<Rc<WatcherState>> = PRE_QUEUE
        .with(|q| q.borrow_mut().drain(..).collect::<Vec<_>>())
        .into_iter()
        .chain(POST_QUEUE.with(|q| q.borrow_mut().drain(..).collect::<Vec<_>>()))
        .collect();
    for job in dropped {
        job.queued.set(false);
        if !job.active.get() {
            dispose(&job);
        }
    }
}
