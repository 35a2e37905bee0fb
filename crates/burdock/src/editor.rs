//
// editor.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use crate::signal::Signal;

/// A code editor whose contents can be inspected, e.g. the active cell of a
/// notebook or the prompt of a console. Owned by the host; inspection
/// handlers only keep weak references to it.
pub trait Editor {
    /// The full text of the editor.
    fn text(&self) -> String;

    /// Position of the cursor, as a byte offset into `text()`.
    fn cursor_position(&self) -> usize;

    /// Emitted after the text changes.
    fn content_changed(&self) -> &Signal<()>;

    /// Emitted after the cursor or selection moves.
    fn selection_changed(&self) -> &Signal<()>;
}

/// Converts a byte offset into `text` to a character offset, which is what
/// kernels expect for cursor positions.
///
/// Offsets past the end of the text are clamped to the end, and offsets that
/// fall inside a multi-byte character are moved back to its start.
pub fn char_offset(text: &str, byte_offset: usize) -> usize {
    let mut end = byte_offset.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].chars().count()
}
