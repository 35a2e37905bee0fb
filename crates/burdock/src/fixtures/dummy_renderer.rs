/*
 * dummy_renderer.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;

use crate::rendermime::MimeModel;
use crate::rendermime::Renderer;
use crate::rendermime::RendererFactory;
use crate::rendermime::TextRenderer;

/// A text renderer that can be slowed down or made to fail.
pub struct DummyRenderer {
    inner: TextRenderer,
    delay: Duration,
    fail: bool,
}

impl DummyRenderer {
    pub fn text(&self) -> Option<String> {
        self.inner.text()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }
}

#[async_trait(?Send)]
impl Renderer for DummyRenderer {
    fn mime_type(&self) -> &str {
        self.inner.mime_type()
    }

    async fn render_model(&self, model: &MimeModel) -> anyhow::Result<()> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            anyhow::bail!("Rendering failed on purpose");
        }
        self.inner.render_model(model).await
    }

    fn dispose(&self) {
        self.inner.dispose();
    }
}

/// Creates [`DummyRenderer`]s and keeps track of them, so that tests can look
/// at what was rendered.
pub struct DummyRendererFactory {
    mime_types: Vec<String>,
    created: RefCell<Vec<Rc<DummyRenderer>>>,
    delay: Cell<Duration>,
    fail: Cell<bool>,
}

impl DummyRendererFactory {
    pub fn new(mime_types: &[&str]) -> Rc<Self> {
        Rc::new(Self {
            mime_types: mime_types.iter().map(|mime| String::from(*mime)).collect(),
            created: RefCell::new(Vec::new()),
            delay: Cell::new(Duration::ZERO),
            fail: Cell::new(false),
        })
    }

    /// Makes renderers created from now on take `delay` to render.
    pub fn set_delay(&self, delay: Duration) {
        self.delay.set(delay);
    }

    /// Makes renderers created from now on fail to render.
    pub fn set_fail(&self, fail: bool) {
        self.fail.set(fail);
    }

    pub fn created(&self) -> Vec<Rc<DummyRenderer>> {
        self.created.borrow().clone()
    }

    /// Finds the renderer behind `renderer`, if this factory created it.
    pub fn find(&self, renderer: &Rc<dyn Renderer>) -> Option<Rc<DummyRenderer>> {
        self.created
            .borrow()
            .iter()
            .find(|created| std::ptr::addr_eq(Rc::as_ptr(*created), Rc::as_ptr(renderer)))
            .cloned()
    }

    /// Text rendered by `renderer`.
    pub fn text_of(&self, renderer: &Rc<dyn Renderer>) -> Option<String> {
        self.find(renderer).and_then(|renderer| renderer.text())
    }
}

impl RendererFactory for DummyRendererFactory {
    fn mime_types(&self) -> Vec<String> {
        self.mime_types.clone()
    }

    fn create_renderer(&self, mime_type: &str) -> Rc<dyn Renderer> {
        let renderer = Rc::new(DummyRenderer {
            inner: TextRenderer::new(mime_type),
            delay: self.delay.get(),
            fail: self.fail.get(),
        });
        self.created.borrow_mut().push(renderer.clone());
        renderer
    }
}
