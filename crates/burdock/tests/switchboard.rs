/*
 * switchboard.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use assert_matches::assert_matches;
use burdock::config::DEFAULT_PLACEHOLDER;
use burdock::fixtures::dummy_host::DummyHost;
use burdock::inspector::inspection::InspectionUpdate;
use burdock::inspector::Inspectable;
use burdock::rendermime::TextRenderer;
use burdock::signal::Signal;
use burdock::switchboard::Content;
use burdock::switchboard::ContentHost;
use burdock::switchboard::Switchboard;

/// A source driven by hand.
#[derive(Default)]
struct ManualSource {
    inspected: Signal<InspectionUpdate>,
    disposed: Signal<()>,
    is_disposed: Cell<bool>,
    standby: Cell<bool>,
}

impl ManualSource {
    fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn dispose(&self) {
        if self.is_disposed.replace(true) {
            return;
        }
        self.disposed.emit(&());
        self.inspected.disconnect_all();
        self.disposed.disconnect_all();
    }
}

impl Inspectable for ManualSource {
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

fn setup() -> (Rc<DummyHost>, Rc<Switchboard>) {
    let host = Rc::new(DummyHost::new());
    let switchboard = Switchboard::new(host.clone(), DEFAULT_PLACEHOLDER);
    (host, switchboard)
}

fn renderer() -> Rc<TextRenderer> {
    Rc::new(TextRenderer::new("text/plain"))
}

fn shows(content: &Content, renderer: &Rc<TextRenderer>) -> bool {
    match content {
        Content::Rendered(shown) => {
            std::ptr::addr_eq(Rc::as_ptr(shown), Rc::as_ptr(renderer))
        },
        Content::Placeholder(_) => false,
    }
}

fn as_source(source: &Rc<ManualSource>) -> Option<Rc<dyn Inspectable>> {
    Some(source.clone())
}

#[test]
fn test_placeholder_is_shown_first() {
    let (host, switchboard) = setup();
    assert_matches!(
        host.shown().as_slice(),
        [Content::Placeholder(message)] if message == "Click on a dataframe to see invariants."
    );
    assert_matches!(switchboard.content(), Content::Placeholder(_));
    assert!(switchboard.source().is_none());
}

#[test]
fn test_updates_of_the_source_are_shown() {
    let (host, switchboard) = setup();
    let source = ManualSource::new();
    source.set_standby(true);

    switchboard.set_source(as_source(&source));
    assert!(!source.standby());

    let first = renderer();
    source.inspected().emit(&InspectionUpdate::rendered(first.clone()));
    assert!(shows(&host.last_shown().unwrap(), &first));

    // Cleared updates keep the latest result on display
    source.inspected().emit(&InspectionUpdate::cleared());
    assert!(shows(&switchboard.content(), &first));

    // The renderer on display is not shown twice
    source.inspected().emit(&InspectionUpdate::rendered(first.clone()));
    assert_eq!(host.shown().len(), 2);

    let second = renderer();
    source.inspected().emit(&InspectionUpdate::rendered(second.clone()));
    assert!(shows(&host.last_shown().unwrap(), &second));
    assert!(first.is_disposed());
    assert!(!second.is_disposed());
    assert_eq!(host.shown().len(), 3);
}

#[test]
fn test_swapping_sources() {
    let (host, switchboard) = setup();
    let old = ManualSource::new();
    let new = ManualSource::new();

    switchboard.set_source(as_source(&old));
    switchboard.set_source(as_source(&new));

    assert!(old.standby());
    assert!(!new.standby());
    assert_eq!(old.inspected().receiver_count(), 0);
    assert_eq!(old.disposed().receiver_count(), 0);
    assert_eq!(new.inspected().receiver_count(), 1);

    // The old source no longer reaches the display
    old.inspected().emit(&InspectionUpdate::rendered(renderer()));
    assert_eq!(host.shown().len(), 1);

    switchboard.set_source(None);
    assert!(new.standby());
    assert!(switchboard.source().is_none());
    assert_eq!(new.inspected().receiver_count(), 0);
}

#[test]
fn test_same_source_is_a_no_op() {
    let (_host, switchboard) = setup();
    let source = ManualSource::new();

    switchboard.set_source(as_source(&source));
    source.set_standby(true);
    switchboard.set_source(as_source(&source));

    assert!(source.standby());
    assert_eq!(source.inspected().receiver_count(), 1);
}

#[test]
fn test_disposed_source_is_rejected() {
    let (_host, switchboard) = setup();
    let current = ManualSource::new();
    let disposed = ManualSource::new();
    disposed.dispose();

    switchboard.set_source(as_source(&current));
    switchboard.set_source(as_source(&disposed));

    assert!(switchboard.source().is_none());
    assert!(current.standby());
    assert_eq!(disposed.inspected().receiver_count(), 0);
}

#[test]
fn test_source_disposal_detaches_it() {
    let (host, switchboard) = setup();
    let source = ManualSource::new();
    switchboard.set_source(as_source(&source));

    let shown = renderer();
    source.inspected().emit(&InspectionUpdate::rendered(shown.clone()));
    source.dispose();

    assert!(switchboard.source().is_none());
    assert_eq!(source.inspected().receiver_count(), 0);

    // The last result stays on display
    assert!(shows(&switchboard.content(), &shown));
    assert!(!shown.is_disposed());
    assert_eq!(host.shown().len(), 2);
}

/// A host that pushes a new result from the source while it is showing one.
#[derive(Default)]
struct ReentrantHost {
    source: RefCell<Option<Rc<ManualSource>>>,
    next: RefCell<Option<Rc<TextRenderer>>>,
    shown: RefCell<Vec<Content>>,
}

impl ContentHost for ReentrantHost {
    fn show(&self, content: &Content) {
        self.shown.borrow_mut().push(content.clone());

        let next = self.next.borrow_mut().take();
        let source = self.source.borrow().clone();
        if let (Some(next), Some(source)) = (next, source) {
            source.inspected().emit(&InspectionUpdate::rendered(next));
        }
    }
}

#[test]
fn test_host_may_reenter_while_showing() {
    let host = Rc::new(ReentrantHost::default());
    let switchboard = Switchboard::new(host.clone(), DEFAULT_PLACEHOLDER);
    let source = ManualSource::new();
    switchboard.set_source(as_source(&source));

    let first = renderer();
    let second = renderer();
    *host.source.borrow_mut() = Some(source.clone());
    *host.next.borrow_mut() = Some(second.clone());

    source.inspected().emit(&InspectionUpdate::rendered(first.clone()));

    let shown = host.shown.borrow();
    assert_eq!(shown.len(), 3);
    assert!(shows(&shown[1], &first));
    assert!(shows(&shown[2], &second));
    assert!(shows(&switchboard.content(), &second));
    assert!(first.is_disposed());
}
