//
// debounce.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::future::LocalBoxFuture;
use tokio::task::JoinHandle;

type Callback = Rc<dyn Fn() -> LocalBoxFuture<'static, ()>>;

/// Runs a callback once invocations have been quiet for `limit`. Each
/// invocation restarts the timer.
///
/// Only the timer is cancellable: once it fires, the callback runs in its own
/// task and is not affected by later invocations or by `stop()`. Timers are
/// spawned on the current `LocalSet`.
pub struct Debouncer {
    limit: Duration,
    callback: Callback,
    timer: RefCell<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new<F>(limit: Duration, callback: F) -> Self
    where
        F: Fn() -> LocalBoxFuture<'static, ()> + 'static,
    {
        Self {
            limit,
            callback: Rc::new(callback),
            timer: RefCell::new(None),
        }
    }

    pub fn invoke(&self) {
        self.stop();

        let callback = self.callback.clone();
        let limit = self.limit;
        let timer = tokio::task::spawn_local(async move {
            tokio::time::sleep(limit).await;
            tokio::task::spawn_local(callback());
        });

        *self.timer.borrow_mut() = Some(timer);
    }

    /// Whether a timer is running.
    pub fn is_pending(&self) -> bool {
        self.timer
            .borrow()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    /// Cancels the running timer, if any.
    pub fn stop(&self) {
        if let Some(timer) = self.timer.borrow_mut().take() {
            timer.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.stop();
    }
}
