//! Re-scan triggering for dynamically changing pages.
//!
//! After `start`, one scan runs once the initial delay has passed, and page
//! mutations are honoured once the watcher has attached. A burst of
//! mutations is coalesced: the scan runs when no further mutation has been
//! seen for the quiet window (trailing edge).

use crate::config::WatchPolicy;
use crate::timer::Scheduler;
use log::debug;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub struct ChangeWatcher<S: Scheduler> {
    scheduler: S,
    policy: WatchPolicy,
    on_scan: Rc<dyn Fn()>,
    attached: Cell<bool>,
    startup: RefCell<Vec<S::Handle>>,
    pending: RefCell<Option<S::Handle>>,
    this: Weak<Self>,
}

impl<S: Scheduler + 'static> ChangeWatcher<S> {
    pub fn new(scheduler: S, policy: WatchPolicy, on_scan: Rc<dyn Fn()>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            scheduler,
            policy,
            on_scan,
            attached: Cell::new(false),
            startup: RefCell::new(Vec::new()),
            pending: RefCell::new(None),
            this: this.clone(),
        })
    }

    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    /// Schedule the initial scan and the attachment.
    pub fn start(&self) {
        let scan = self.this.clone();
        let initial = self.scheduler.schedule(
            self.policy.initial_scan_ms,
            Box::new(move || {
                if let Some(watcher) = scan.upgrade() {
                    debug!("Running initial scan");
                    (watcher.on_scan)();
                }
            }),
        );

        let attach = self.this.clone();
        let attaching = self.scheduler.schedule(
            self.policy.attach_ms,
            Box::new(move || {
                if let Some(watcher) = attach.upgrade() {
                    debug!("Watching page for changes");
                    watcher.attached.set(true);
                }
            }),
        );

        let mut startup = self.startup.borrow_mut();
        startup.clear();
        startup.push(initial);
        startup.push(attaching);
    }

    /// Record a structural page change. Restarts the quiet window.
    pub fn notify_mutation(&self) {
        if !self.attached.get() {
            return;
        }

        let this = self.this.clone();
        let handle = self.scheduler.schedule(
            self.policy.quiet_ms,
            Box::new(move || {
                if let Some(watcher) = this.upgrade() {
                    debug!("Page settled, re-scanning");
                    (watcher.on_scan)();
                }
            }),
        );
        // Replacing the handle cancels the previous pending scan. A handle
        // whose task already ran is only dropped here, never from inside it.
        let previous = self.pending.borrow_mut().replace(handle);
        drop(previous);
    }

    /// Stop reacting to mutations and cancel anything scheduled.
    pub fn detach(&self) {
        self.attached.set(false);
        self.startup.borrow_mut().clear();
        let pending = self.pending.borrow_mut().take();
        drop(pending);
    }
}
