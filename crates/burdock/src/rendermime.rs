//
// rendermime.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;

use crate::error::Error;

/// A mapping from MIME type to payload, as found in the `data` field of
/// Jupyter display messages.
pub type MimeBundle = Map<String, Value>;

/// The data and metadata handed to a renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MimeModel {
    pub data: MimeBundle,
    pub metadata: Map<String, Value>,
}

impl MimeModel {
    pub fn new(data: MimeBundle, metadata: Map<String, Value>) -> Self {
        Self { data, metadata }
    }
}

/// Something able to display one MIME type. Renderers are shared between the
/// handler that produced them and the display currently showing them, hence
/// `&self` methods.
#[async_trait(?Send)]
pub trait Renderer {
    /// The MIME type this renderer displays.
    fn mime_type(&self) -> &str;

    async fn render_model(&self, model: &MimeModel) -> anyhow::Result<()>;

    /// Called when the renderer is taken off the display.
    fn dispose(&self) {}
}

/// Looks up renderers for MIME bundles. Hosts with their own rendering stack
/// implement this; [`MimeRegistry`] is a standalone implementation.
pub trait RenderMimeRegistry {
    /// The best MIME type in `bundle` that can be rendered, if any.
    fn preferred_mime_type(&self, bundle: &MimeBundle) -> Option<String>;

    fn create_renderer(&self, mime_type: &str) -> crate::Result<Rc<dyn Renderer>>;
}

pub trait RendererFactory {
    fn mime_types(&self) -> Vec<String>;
    fn create_renderer(&self, mime_type: &str) -> Rc<dyn Renderer>;
}

struct RankedFactory {
    rank: i32,
    factory: Rc<dyn RendererFactory>,
}

/// Renderer factories ordered by rank; lower ranks are preferred. Factories
/// with the same rank keep their registration order.
#[derive(Default)]
pub struct MimeRegistry {
    factories: Vec<RankedFactory>,
}

impl MimeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that only knows about `text/plain`.
    pub fn plain_text() -> Self {
        let mut registry = Self::new();
        registry.add_factory(Rc::new(TextRendererFactory), 100);
        registry
    }

    pub fn add_factory(&mut self, factory: Rc<dyn RendererFactory>, rank: i32) {
        let index = self
            .factories
            .iter()
            .position(|entry| entry.rank > rank)
            .unwrap_or(self.factories.len());
        self.factories.insert(index, RankedFactory { rank, factory });
    }

    /// All MIME types the registry can render, most preferred first.
    pub fn mime_types(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for entry in &self.factories {
            for mime_type in entry.factory.mime_types() {
                if !out.contains(&mime_type) {
                    out.push(mime_type);
                }
            }
        }
        out
    }
}

impl RenderMimeRegistry for MimeRegistry {
    fn preferred_mime_type(&self, bundle: &MimeBundle) -> Option<String> {
        self.mime_types()
            .into_iter()
            .find(|mime_type| bundle.contains_key(mime_type))
    }

    fn create_renderer(&self, mime_type: &str) -> crate::Result<Rc<dyn Renderer>> {
        for entry in &self.factories {
            if entry.factory.mime_types().iter().any(|other| other == mime_type) {
                return Ok(entry.factory.create_renderer(mime_type));
            }
        }
        Err(Error::UnknownMimeType(String::from(mime_type)))
    }
}

pub struct TextRendererFactory;

impl RendererFactory for TextRendererFactory {
    fn mime_types(&self) -> Vec<String> {
        vec![String::from("text/plain")]
    }

    fn create_renderer(&self, mime_type: &str) -> Rc<dyn Renderer> {
        Rc::new(TextRenderer::new(mime_type))
    }
}

/// Renders textual payloads into a string the host can display as is.
pub struct TextRenderer {
    mime_type: String,
    text: RefCell<Option<String>>,
    disposed: Cell<bool>,
}

impl TextRenderer {
    pub fn new(mime_type: &str) -> Self {
        Self {
            mime_type: String::from(mime_type),
            text: RefCell::new(None),
            disposed: Cell::new(false),
        }
    }

    /// The rendered text, `None` until a model has been rendered.
    pub fn text(&self) -> Option<String> {
        self.text.borrow().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

#[async_trait(?Send)]
impl Renderer for TextRenderer {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn render_model(&self, model: &MimeModel) -> anyhow::Result<()> {
        let Some(payload) = model.data.get(&self.mime_type) else {
            anyhow::bail!("No '{}' payload in the bundle", self.mime_type);
        };

        let text = match payload {
            Value::String(text) => text.clone(),
            // Jupyter allows multiline strings to be split into a list of lines
            Value::Array(lines) if lines.iter().all(Value::is_string) => lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(""),
            other => serde_json::to_string_pretty(other)?,
        };

        *self.text.borrow_mut() = Some(text);
        Ok(())
    }

    fn dispose(&self) {
        self.disposed.set(true);
    }
}
