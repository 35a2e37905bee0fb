//
// switchboard.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::rc::Weak;

use crate::inspector::inspection::InspectionUpdate;
use crate::inspector::Inspectable;
use crate::rendermime::Renderer;
use crate::signal::Connection;

/// What the display currently shows.
#[derive(Clone)]
pub enum Content {
    /// A message shown until the first result arrives.
    Placeholder(String),
    Rendered(Rc<dyn Renderer>),
}

impl Content {
    pub fn renderer(&self) -> Option<&Rc<dyn Renderer>> {
        match self {
            Content::Placeholder(_) => None,
            Content::Rendered(renderer) => Some(renderer),
        }
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Content::Placeholder(message) => write!(f, "Placeholder({message:?})"),
            Content::Rendered(renderer) => write!(f, "Rendered({})", renderer.mime_type()),
        }
    }
}

/// The panel (or any other surface) displaying inspection results.
pub trait ContentHost {
    fn show(&self, content: &Content);
}

/// Feeds the results of one source at a time to a display.
///
/// Sources that are not connected to the switchboard are put on standby so
/// that they stop making requests. The display keeps the latest rendered
/// result: cleared updates don't blank it.
pub struct Switchboard {
    this: Weak<Switchboard>,
    host: Rc<dyn ContentHost>,
    source: RefCell<Option<Rc<dyn Inspectable>>>,
    connections: RefCell<Vec<Connection>>,
    content: RefCell<Content>,
}

impl Switchboard {
    pub fn new(host: Rc<dyn ContentHost>, placeholder: &str) -> Rc<Self> {
        let content = Content::Placeholder(String::from(placeholder));
        host.show(&content);

        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            host,
            source: RefCell::new(None),
            connections: RefCell::new(Vec::new()),
            content: RefCell::new(content),
        })
    }

    pub fn source(&self) -> Option<Rc<dyn Inspectable>> {
        self.source.borrow().clone()
    }

    pub fn content(&self) -> Content {
        self.content.borrow().clone()
    }

    pub fn set_source(&self, source: Option<Rc<dyn Inspectable>>) {
        if self.is_current(source.as_ref()) {
            return;
        }

        // Take the old source off the air
        let old = self.source.borrow_mut().take();
        let connections: Vec<Connection> = self.connections.borrow_mut().drain(..).collect();
        drop(connections);
        if let Some(old) = old {
            old.set_standby(true);
        }

        let source = match source {
            Some(source) if source.is_disposed() => {
                log::warn!("Inspector switchboard was given a disposed source");
                None
            },
            source => source,
        };
        let Some(source) = source else {
            return;
        };

        *self.source.borrow_mut() = Some(source.clone());
        source.set_standby(false);

        let on_inspected = source.inspected().connect({
            let this = self.this.clone();
            move |update: &InspectionUpdate| {
                if let Some(this) = this.upgrade() {
                    this.on_source_inspected(update);
                }
            }
        });
        let on_disposed = source.disposed().connect({
            let this = self.this.clone();
            move |_: &()| {
                if let Some(this) = this.upgrade() {
                    this.set_source(None);
                }
            }
        });

        let mut connections = self.connections.borrow_mut();
        connections.push(on_inspected);
        connections.push(on_disposed);
    }

    fn on_source_inspected(&self, update: &InspectionUpdate) {
        let Some(renderer) = &update.content else {
            return;
        };

        let previous = {
            let mut content = self.content.borrow_mut();
            if let Content::Rendered(current) = &*content {
                if std::ptr::addr_eq(Rc::as_ptr(current), Rc::as_ptr(renderer)) {
                    return;
                }
            }
            std::mem::replace(&mut *content, Content::Rendered(renderer.clone()))
        };

        if let Some(previous) = previous.renderer() {
            previous.dispose();
        }
        // The host may reenter the switchboard
        let content = self.content.borrow().clone();
        self.host.show(&content);
    }

    fn is_current(&self, source: Option<&Rc<dyn Inspectable>>) -> bool {
        match (self.source.borrow().as_ref(), source) {
            (None, None) => true,
            (Some(current), Some(source)) => {
                std::ptr::addr_eq(Rc::as_ptr(current), Rc::as_ptr(source))
            },
            _ => false,
        }
    }
}
