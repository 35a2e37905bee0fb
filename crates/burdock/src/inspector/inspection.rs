//
// inspection.rs
//
// Copyright (C) 2026 Posit Software, PBC. All rights reserved.
//
//

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::rendermime::MimeBundle;
use crate::rendermime::MimeModel;
use crate::rendermime::Renderer;

/// Parameters for the `inspect` method: the full source of the editor and
/// the cursor position as a character offset into it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InspectionRequest {
    pub text: String,
    pub offset: usize,
}

/// Result of the `inspect` method.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InspectionReply {
    /// The result, keyed by MIME type
    pub data: MimeBundle,

    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl InspectionReply {
    pub fn model(&self) -> MimeModel {
        MimeModel::new(self.data.clone(), self.metadata.clone())
    }
}

/// What the display should show after an inspection cycle. `None` clears
/// the display.
#[derive(Clone, Default)]
pub struct InspectionUpdate {
    pub content: Option<Rc<dyn Renderer>>,
}

impl InspectionUpdate {
    pub fn cleared() -> Self {
        Self { content: None }
    }

    pub fn rendered(renderer: Rc<dyn Renderer>) -> Self {
        Self {
            content: Some(renderer),
        }
    }
}

impl fmt::Debug for InspectionUpdate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.content {
            Some(renderer) => write!(f, "InspectionUpdate({})", renderer.mime_type()),
            None => write!(f, "InspectionUpdate(cleared)"),
        }
    }
}
