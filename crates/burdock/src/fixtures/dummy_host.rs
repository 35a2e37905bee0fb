/*
 * dummy_host.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::cell::RefCell;

use crate::switchboard::Content;
use crate::switchboard::ContentHost;

/// A display that records everything it is asked to show.
#[derive(Default)]
pub struct DummyHost {
    shown: RefCell<Vec<Content>>,
}

impl DummyHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<Content> {
        self.shown.borrow().clone()
    }

    pub fn last_shown(&self) -> Option<Content> {
        self.shown.borrow().last().cloned()
    }
}

impl ContentHost for DummyHost {
    fn show(&self, content: &Content) {
        self.shown.borrow_mut().push(content.clone());
    }
}
