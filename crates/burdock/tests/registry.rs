/*
 * registry.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::rc::Rc;
use std::time::Duration;

use burdock::config::InspectorConfig;
use burdock::fixtures::dummy_editor::DummyEditor;
use burdock::fixtures::dummy_host::DummyHost;
use burdock::fixtures::dummy_kernel::DummyKernel;
use burdock::fixtures::dummy_renderer::DummyRendererFactory;
use burdock::inspector::Inspectable;
use burdock::registry::DocumentRegistry;
use burdock::rendermime::MimeRegistry;
use burdock::switchboard::Content;
use burdock::switchboard::Switchboard;
use serde_json::json;
use tokio::task::LocalSet;

struct Fixture {
    host: Rc<DummyHost>,
    factory: Rc<DummyRendererFactory>,
    switchboard: Rc<Switchboard>,
    registry: Rc<DocumentRegistry>,
}

impl Fixture {
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let factory = DummyRendererFactory::new(&["text/plain"]);
        let mut rendermime = MimeRegistry::new();
        rendermime.add_factory(factory.clone(), 0);

        let config = InspectorConfig::from_json(json!({"debounce_ms": 100})).unwrap();
        let host = Rc::new(DummyHost::new());
        let switchboard = Switchboard::new(host.clone(), &config.placeholder);
        let registry = DocumentRegistry::new(switchboard.clone(), Rc::new(rendermime), config);

        Self {
            host,
            factory,
            switchboard,
            registry,
        }
    }

    /// Text of the renderer on display.
    fn shown_text(&self) -> Option<String> {
        let Content::Rendered(renderer) = self.host.last_shown()? else {
            return None;
        };
        self.factory.text_of(&renderer)
    }

    fn is_source(&self, id: &str) -> bool {
        let Some(source) = self.switchboard.source() else {
            return false;
        };
        let Some(handler) = self.registry.handler(id) else {
            return false;
        };
        std::ptr::addr_eq(Rc::as_ptr(&source), Rc::as_ptr(&handler))
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

#[tokio::test(start_paused = true)]
async fn test_current_document_feeds_the_display() {
    LocalSet::new()
        .run_until(async {
            let fixture = Fixture::new();
            let kernel = DummyKernel::new();
            let editor = DummyEditor::new("df.he");

            let handler = fixture.registry.document_opened("notebook-1", kernel.clone());
            assert_eq!(fixture.registry.len(), 1);
            assert!(handler.standby());

            fixture.registry.current_changed(Some("notebook-1"));
            assert!(fixture.is_source("notebook-1"));
            assert!(!handler.standby());

            fixture
                .registry
                .active_editor_changed("notebook-1", Some(editor.clone()));
            settle().await;

            assert_eq!(kernel.requests().len(), 1);
            assert_eq!(fixture.shown_text().as_deref(), Some("df.he@5"));

            // Edits are followed with the configured debounce
            editor.type_text("ad");
            tokio::time::sleep(Duration::from_millis(150)).await;
            assert_eq!(kernel.requests().len(), 2);
            assert_eq!(kernel.requests()[1].request.text, "df.head");
            assert_eq!(fixture.shown_text().as_deref(), Some("df.head@7"));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_documents_in_background_are_on_standby() {
    LocalSet::new()
        .run_until(async {
            let fixture = Fixture::new();
            let kernel = DummyKernel::new();

            let first = fixture.registry.document_opened("notebook-1", kernel.clone());
            let second = fixture.registry.document_opened("console-1", kernel.clone());
            fixture.registry.current_changed(Some("notebook-1"));

            let editor = DummyEditor::new("x");
            fixture
                .registry
                .active_editor_changed("console-1", Some(editor.clone()));
            settle().await;
            assert!(kernel.requests().is_empty());

            fixture.registry.current_changed(Some("console-1"));
            assert!(first.standby());
            assert!(!second.standby());
            assert!(fixture.is_source("console-1"));

            fixture.registry.current_changed(Some("unknown"));
            assert!(fixture.switchboard.source().is_none());
            assert!(second.standby());

            fixture.registry.current_changed(None);
            assert!(fixture.switchboard.source().is_none());
            assert_eq!(fixture.registry.current(), None);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_closing_a_document_disposes_its_handler() {
    LocalSet::new()
        .run_until(async {
            let fixture = Fixture::new();
            let kernel = DummyKernel::new();
            let editor = DummyEditor::new("df");

            let handler = fixture.registry.document_opened("notebook-1", kernel.clone());
            fixture.registry.current_changed(Some("notebook-1"));
            fixture
                .registry
                .active_editor_changed("notebook-1", Some(editor.clone()));
            settle().await;

            fixture.registry.document_closed("notebook-1");
            settle().await;

            assert!(handler.is_disposed());
            assert!(fixture.registry.is_empty());
            assert!(fixture.switchboard.source().is_none());
            assert_eq!(fixture.registry.current(), None);
            assert_eq!(kernel.closed_comms().len(), 1);

            // Closing twice is harmless
            fixture.registry.document_closed("notebook-1");
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_disposed_handlers_are_forgotten() {
    LocalSet::new()
        .run_until(async {
            let fixture = Fixture::new();
            let handler = fixture
                .registry
                .document_opened("notebook-1", DummyKernel::new());

            handler.dispose();
            assert!(fixture.registry.is_empty());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_reopening_replaces_the_handler() {
    LocalSet::new()
        .run_until(async {
            let fixture = Fixture::new();
            let kernel = DummyKernel::new();

            let first = fixture.registry.document_opened("notebook-1", kernel.clone());
            fixture.registry.current_changed(Some("notebook-1"));
            let second = fixture.registry.document_opened("notebook-1", kernel.clone());

            assert!(first.is_disposed());
            assert!(!second.is_disposed());
            assert_eq!(fixture.registry.len(), 1);
            assert!(fixture.is_source("notebook-1"));
            assert!(!second.standby());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_kernel_change_carries_the_editor_over() {
    LocalSet::new()
        .run_until(async {
            let fixture = Fixture::new();
            let old_kernel = DummyKernel::new();
            let new_kernel = DummyKernel::new();
            let editor = DummyEditor::new("df");

            let old = fixture.registry.document_opened("notebook-1", old_kernel.clone());
            fixture.registry.current_changed(Some("notebook-1"));
            fixture
                .registry
                .active_editor_changed("notebook-1", Some(editor.clone()));
            settle().await;
            assert_eq!(old_kernel.requests().len(), 1);

            fixture.registry.kernel_changed("notebook-1", new_kernel.clone());
            settle().await;

            let new = fixture.registry.handler("notebook-1").unwrap();
            assert!(old.is_disposed());
            assert!(!new.is_disposed());
            assert!(fixture.is_source("notebook-1"));
            assert_eq!(old_kernel.closed_comms().len(), 1);

            // The new handler inspects the same editor on the new kernel
            assert!(std::ptr::addr_eq(
                Rc::as_ptr(&new.editor().unwrap()),
                Rc::as_ptr(&editor)
            ));
            assert_eq!(new_kernel.requests().len(), 1);
            assert_eq!(new_kernel.requests()[0].request.text, "df");

            editor.type_text(".x");
            tokio::time::sleep(Duration::from_millis(500)).await;
            assert_eq!(old_kernel.requests().len(), 1);
            assert_eq!(new_kernel.requests().len(), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_dispose_tears_everything_down() {
    LocalSet::new()
        .run_until(async {
            let fixture = Fixture::new();
            let first = fixture
                .registry
                .document_opened("notebook-1", DummyKernel::new());
            let second = fixture
                .registry
                .document_opened("notebook-2", DummyKernel::new());
            fixture.registry.current_changed(Some("notebook-2"));

            fixture.registry.dispose();

            assert!(first.is_disposed());
            assert!(second.is_disposed());
            assert!(fixture.registry.is_empty());
            assert!(fixture.switchboard.source().is_none());
        })
        .await;
}
