/*
 * dummy_editor.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use crate::editor::Editor;
use crate::signal::Signal;

/// An in-memory editor for tests. Mutations emit the same signals a real
/// editor would.
pub struct DummyEditor {
    text: RefCell<String>,
    cursor: Cell<usize>,
    content_changed: Signal<()>,
    selection_changed: Signal<()>,
}

impl DummyEditor {
    /// Creates an editor containing `text`, with the cursor at the end.
    pub fn new(text: &str) -> Rc<Self> {
        Rc::new(Self {
            text: RefCell::new(String::from(text)),
            cursor: Cell::new(text.len()),
            content_changed: Signal::new(),
            selection_changed: Signal::new(),
        })
    }

    /// Replaces the whole text and moves the cursor to the end.
    pub fn set_text(&self, text: &str) {
        *self.text.borrow_mut() = String::from(text);
        self.cursor.set(text.len());
        self.content_changed.emit(&());
    }

    /// Moves the cursor to the byte position `cursor`.
    pub fn set_cursor(&self, cursor: usize) {
        self.cursor.set(cursor);
        self.selection_changed.emit(&());
    }

    /// Inserts `text` at the cursor, like a user typing it.
    pub fn type_text(&self, text: &str) {
        let cursor = self.cursor.get().min(self.text.borrow().len());
        self.text.borrow_mut().insert_str(cursor, text);
        self.cursor.set(cursor + text.len());
        self.content_changed.emit(&());
        self.selection_changed.emit(&());
    }
}

impl Editor for DummyEditor {
    fn text(&self) -> String {
        self.text.borrow().clone()
    }

    fn cursor_position(&self) -> usize {
        self.cursor.get()
    }

    fn content_changed(&self) -> &Signal<()> {
        &self.content_changed
    }

    fn selection_changed(&self) -> &Signal<()> {
        &self.selection_changed
    }
}
