//
// handler.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;
use std::rc::Weak;
use std::time::Duration;

use futures::FutureExt;

use crate::comm::connector::InspectionConnector;
use crate::config::DEFAULT_DEBOUNCE_MS;
use crate::editor::char_offset;
use crate::editor::Editor;
use crate::error::Error;
use crate::inspector::debounce::Debouncer;
use crate::inspector::inspection::InspectionReply;
use crate::inspector::inspection::InspectionRequest;
use crate::inspector::inspection::InspectionUpdate;
use crate::inspector::Inspectable;
use crate::rendermime::RenderMimeRegistry;
use crate::signal::Connection;
use crate::signal::Signal;

pub struct HandlerOptions {
    /// Used to make inspection requests. Disposed with the handler.
    pub connector: Rc<dyn InspectionConnector>,

    pub rendermime: Rc<dyn RenderMimeRegistry>,

    /// Quiet period after the last edit before a request is made.
    pub debounce: Duration,
}

impl HandlerOptions {
    pub fn new(
        connector: Rc<dyn InspectionConnector>,
        rendermime: Rc<dyn RenderMimeRegistry>,
    ) -> Self {
        Self {
            connector,
            rendermime,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

/// Turns the edits of one editor into inspection requests, and their replies
/// into rendered updates.
///
/// Requests are stamped with a serial number. A reply is only displayed if
/// no newer request was made while it was in flight, so slow replies never
/// overwrite the result of a later request.
///
/// The handler only holds a weak reference to its editor. Inspection cycles
/// run on the current `LocalSet`.
pub struct InspectionHandler {
    this: Weak<InspectionHandler>,
    connector: Rc<dyn InspectionConnector>,
    rendermime: Rc<dyn RenderMimeRegistry>,
    editor: RefCell<Option<Weak<dyn Editor>>>,
    editor_connections: RefCell<Vec<Connection>>,
    binding: Cell<u64>,
    debouncer: Debouncer,
    pending: Cell<u64>,
    standby: Cell<bool>,
    is_disposed: Cell<bool>,
    inspected: Signal<InspectionUpdate>,
    cleared: Signal<()>,
    disposed: Signal<()>,
}

impl InspectionHandler {
    pub fn new(options: HandlerOptions) -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let debouncer = Debouncer::new(options.debounce, {
                let this = this.clone();
                move || {
                    let this = this.clone();
                    async move {
                        if let Some(this) = this.upgrade() {
                            this.on_editor_change().await;
                        }
                    }
                    .boxed_local()
                }
            });

            Self {
                this: this.clone(),
                connector: options.connector,
                rendermime: options.rendermime,
                editor: RefCell::new(None),
                editor_connections: RefCell::new(Vec::new()),
                binding: Cell::new(0),
                debouncer,
                pending: Cell::new(0),
                standby: Cell::new(false),
                is_disposed: Cell::new(false),
                inspected: Signal::new(),
                cleared: Signal::new(),
                disposed: Signal::new(),
            }
        })
    }

    /// Emitted when a new editor is bound, before its first inspection.
    pub fn cleared(&self) -> &Signal<()> {
        &self.cleared
    }

    /// The bound editor, if any and if it is still alive.
    pub fn editor(&self) -> Option<Rc<dyn Editor>> {
        self.editor.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// Serial number of the latest request.
    pub fn pending_serial(&self) -> u64 {
        self.pending.get()
    }

    /// Binds the handler to `editor`, or unbinds it with `None`.
    ///
    /// Binding a new editor emits `cleared` and starts an inspection cycle
    /// right away. Edits and cursor moves are followed once that first cycle
    /// has completed.
    pub fn set_editor(&self, editor: Option<Rc<dyn Editor>>) {
        if self.is_bound_to(editor.as_ref()) {
            return;
        }
        if self.is_disposed() {
            log::debug!("Ignoring editor change on a disposed inspection handler");
            return;
        }

        self.editor_connections.borrow_mut().clear();
        self.debouncer.stop();

        let binding = self.binding.get() + 1;
        self.binding.set(binding);
        *self.editor.borrow_mut() = editor.as_ref().map(Rc::downgrade);

        if editor.is_none() {
            return;
        }

        self.cleared.emit(&());

        let Some(this) = self.this.upgrade() else {
            return;
        };
        tokio::task::spawn_local(async move {
            this.on_editor_change().await;
            this.follow_editor(binding);
        });
    }

    /// Runs one inspection cycle on the current state of the bound editor.
    pub async fn on_editor_change(&self) {
        if self.standby.get() || self.is_disposed() {
            return;
        }
        let Some(editor) = self.editor() else {
            return;
        };

        let text = editor.text();
        let offset = char_offset(&text, editor.cursor_position());
        drop(editor);

        let pending = self.pending.get() + 1;
        self.pending.set(pending);

        log::trace!("Inspection request {pending} at offset {offset}");
        match self
            .connector
            .fetch(InspectionRequest { text, offset })
            .await
        {
            Ok(reply) => self.on_reply(pending, reply).await,
            Err(err) => {
                // Failures are expected while kernels start or restart
                log::debug!("Inspection request {pending} failed: {err}");
                if !self.is_disposed() {
                    self.inspected.emit(&InspectionUpdate::cleared());
                }
            },
        }
    }

    async fn on_reply(&self, pending: u64, reply: Option<InspectionReply>) {
        if self.is_disposed() {
            log::trace!("Dropping reply {pending}: handler disposed");
            return;
        }
        if self.is_stale(pending) {
            log::trace!("Dropping reply {pending}: superseded");
            self.inspected.emit(&InspectionUpdate::cleared());
            return;
        }

        let Some(reply) = reply else {
            self.inspected.emit(&InspectionUpdate::cleared());
            return;
        };
        let Some(mime_type) = self.rendermime.preferred_mime_type(&reply.data) else {
            log::debug!("No renderable MIME type in reply {pending}");
            self.inspected.emit(&InspectionUpdate::cleared());
            return;
        };

        let renderer = match self.rendermime.create_renderer(&mime_type) {
            Ok(renderer) => renderer,
            Err(err) => {
                log::debug!("{err}");
                self.inspected.emit(&InspectionUpdate::cleared());
                return;
            },
        };
        if let Err(err) = renderer.render_model(&reply.model()).await {
            log::debug!("{}", Error::RenderFailed(mime_type, err));
            renderer.dispose();
            if !self.is_disposed() {
                self.inspected.emit(&InspectionUpdate::cleared());
            }
            return;
        }

        // Rendering may take a while, check again
        if self.is_disposed() {
            renderer.dispose();
            return;
        }
        if self.is_stale(pending) {
            log::trace!("Dropping rendered reply {pending}: superseded");
            renderer.dispose();
            self.inspected.emit(&InspectionUpdate::cleared());
            return;
        }

        self.inspected.emit(&InspectionUpdate::rendered(renderer));
    }

    /// Disposes the handler and its connector. Idempotent.
    pub fn dispose(&self) {
        if self.is_disposed.replace(true) {
            return;
        }

        self.editor_connections.borrow_mut().clear();
        self.debouncer.stop();
        self.connector.dispose();

        self.disposed.emit(&());

        self.inspected.disconnect_all();
        self.cleared.disconnect_all();
        self.disposed.disconnect_all();
        *self.editor.borrow_mut() = None;
    }

    fn is_stale(&self, pending: u64) -> bool {
        pending != self.pending.get()
    }

    fn is_bound_to(&self, editor: Option<&Rc<dyn Editor>>) -> bool {
        match (self.editor.borrow().as_ref(), editor) {
            (None, None) => true,
            (Some(current), Some(editor)) => {
                std::ptr::addr_eq(current.as_ptr(), Rc::as_ptr(editor))
            },
            _ => false,
        }
    }

    /// Subscribes to the edits of the bound editor, unless another editor was
    /// bound (or the handler disposed) in the meantime.
    fn follow_editor(&self, binding: u64) {
        if self.is_disposed() || self.binding.get() != binding {
            return;
        }
        let Some(editor) = self.editor() else {
            return;
        };

        let on_change = {
            let this = self.this.clone();
            move |_: &()| {
                if let Some(this) = this.upgrade() {
                    this.debouncer.invoke();
                }
            }
        };

        let mut connections = self.editor_connections.borrow_mut();
        connections.push(editor.content_changed().connect(on_change.clone()));
        connections.push(editor.selection_changed().connect(on_change));
    }
}

impl Inspectable for InspectionHandler {
    fn inspected(&self) -> &Signal<InspectionUpdate> {
        &self.inspected
    }

    fn disposed(&self) -> &Signal<()> {
        &self.disposed
    }

    fn is_disposed(&self) -> bool {
        self.is_disposed.get()
    }

    fn standby(&self) -> bool {
        self.standby.get()
    }

    fn set_standby(&self, standby: bool) {
        self.standby.set(standby);
    }
}

impl Drop for InspectionHandler {
    fn drop(&mut self) {
        self.dispose();
    }
}
