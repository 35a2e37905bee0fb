//
// registry.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::rc::Weak;

use crate::comm::connector::CommConnector;
use crate::config::InspectorConfig;
use crate::editor::Editor;
use crate::inspector::handler::HandlerOptions;
use crate::inspector::handler::InspectionHandler;
use crate::inspector::Inspectable;
use crate::kernel::KernelSession;
use crate::rendermime::RenderMimeRegistry;
use crate::signal::Connection;
use crate::switchboard::Switchboard;

struct Entry {
    handler: Rc<InspectionHandler>,
    _on_disposed: Connection,
}

/// Keeps one inspection handler per open document (notebook or console) and
/// routes the current document to the switchboard.
///
/// Handlers of documents that are not current are kept on standby.
pub struct DocumentRegistry {
    this: Weak<DocumentRegistry>,
    switchboard: Rc<Switchboard>,
    rendermime: Rc<dyn RenderMimeRegistry>,
    config: InspectorConfig,
    handlers: RefCell<HashMap<String, Entry>>,
    current: RefCell<Option<String>>,
}

impl DocumentRegistry {
    pub fn new(
        switchboard: Rc<Switchboard>,
        rendermime: Rc<dyn RenderMimeRegistry>,
        config: InspectorConfig,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            switchboard,
            rendermime,
            config,
            handlers: RefCell::new(HashMap::new()),
            current: RefCell::new(None),
        })
    }

    pub fn handler(&self, id: &str) -> Option<Rc<InspectionHandler>> {
        self.handlers
            .borrow()
            .get(id)
            .map(|entry| entry.handler.clone())
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    /// ID of the current document, if any.
    pub fn current(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    /// Creates the handler of a newly opened document. A handler already
    /// registered under `id` is disposed and replaced.
    pub fn document_opened(&self, id: &str, kernel: Rc<dyn KernelSession>) -> Rc<InspectionHandler> {
        log::debug!("Creating inspection handler for document '{id}'");
        let handler = self.create_handler(kernel);
        self.register(id, handler.clone());
        handler
    }

    /// Binds the handler of `id` to the editor that now has the focus.
    pub fn active_editor_changed(&self, id: &str, editor: Option<Rc<dyn Editor>>) {
        match self.handler(id) {
            Some(handler) => handler.set_editor(editor),
            None => log::debug!("No inspection handler for document '{id}'"),
        }
    }

    /// Makes the handler of `id` the source of the switchboard. Unknown
    /// documents, and `None`, leave the switchboard without a source.
    pub fn current_changed(&self, id: Option<&str>) {
        *self.current.borrow_mut() = id.map(String::from);

        let source = id
            .and_then(|id| self.handler(id))
            .map(|handler| handler as Rc<dyn Inspectable>);
        self.switchboard.set_source(source);
    }

    /// Replaces the handler of `id` by one talking to `kernel`. The editor
    /// bound to the old handler is bound to the new one.
    pub fn kernel_changed(&self, id: &str, kernel: Rc<dyn KernelSession>) {
        let Some(old) = self.handler(id) else {
            log::debug!("No inspection handler for document '{id}'");
            return;
        };
        let editor = old.editor();

        log::debug!("Kernel of document '{id}' changed, recreating its inspection handler");
        let handler = self.create_handler(kernel);
        self.register(id, handler.clone());
        handler.set_editor(editor);
    }

    /// Disposes the handler of a closed document.
    pub fn document_closed(&self, id: &str) {
        let entry = self.handlers.borrow_mut().remove(id);
        if let Some(entry) = entry {
            log::debug!("Disposing inspection handler for document '{id}'");
            entry.handler.dispose();
        }
        if self.current.borrow().as_deref() == Some(id) {
            *self.current.borrow_mut() = None;
        }
    }

    /// Disposes all handlers.
    pub fn dispose(&self) {
        let entries: Vec<Entry> = self
            .handlers
            .borrow_mut()
            .drain()
            .map(|(_, entry)| entry)
            .collect();
        for entry in entries {
            entry.handler.dispose();
        }
        *self.current.borrow_mut() = None;
    }

    fn create_handler(&self, kernel: Rc<dyn KernelSession>) -> Rc<InspectionHandler> {
        let connector = Rc::new(CommConnector::new(kernel, &self.config.target_name));
        InspectionHandler::new(HandlerOptions {
            connector,
            rendermime: self.rendermime.clone(),
            debounce: self.config.debounce(),
        })
    }

    fn register(&self, id: &str, handler: Rc<InspectionHandler>) {
        let is_current = self.current.borrow().as_deref() == Some(id);
        handler.set_standby(!is_current);

        let on_disposed = handler.disposed().connect({
            let this = self.this.clone();
            let id = String::from(id);
            let handler = Rc::downgrade(&handler);
            move |_: &()| {
                if let Some(this) = this.upgrade() {
                    this.forget(&id, &handler);
                }
            }
        });

        let old = self.handlers.borrow_mut().insert(String::from(id), Entry {
            handler: handler.clone(),
            _on_disposed: on_disposed,
        });
        if let Some(old) = old {
            old.handler.dispose();
        }

        if is_current {
            self.switchboard
                .set_source(Some(handler as Rc<dyn Inspectable>));
        }
    }

    /// Removes `handler` from the registry, unless `id` has been given a new
    /// handler in the meantime.
    fn forget(&self, id: &str, handler: &Weak<InspectionHandler>) {
        let mut handlers = self.handlers.borrow_mut();
        let is_registered = handlers
            .get(id)
            .is_some_and(|entry| std::ptr::eq(Rc::as_ptr(&entry.handler), handler.as_ptr()));
        if is_registered {
            // Release the borrow before the entry disconnects from the handler
            let entry = handlers.remove(id);
            drop(handlers);
            drop(entry);
        }
    }
}
