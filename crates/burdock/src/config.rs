/*
 * config.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use url::Url;

use crate::error::Error;

pub const DEFAULT_DEBOUNCE_MS: u64 = 250;
pub const DEFAULT_TARGET_NAME: &str = "burdock";
pub const DEFAULT_PLACEHOLDER: &str = "Click on a dataframe to see invariants.";

/// Configuration of the inspector, usually read from the host's settings.
/// Missing fields take their default value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct InspectorConfig {
    /// Quiet period after the last edit before an inspection request is sent.
    pub debounce_ms: u64,

    /// Target name of the comm opened in the kernel.
    pub target_name: String,

    /// Shown by the display until the first inspection result arrives.
    pub placeholder: String,

    pub server: ServerConfig,
}

/// Where to reach the server extension that installs the kernel agent.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub extension: String,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            target_name: String::from(DEFAULT_TARGET_NAME),
            placeholder: String::from(DEFAULT_PLACEHOLDER),
            server: Default::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:8888/"),
            extension: String::from("burdock"),
        }
    }
}

impl InspectorConfig {
    pub fn from_json(value: serde_json::Value) -> crate::Result<Self> {
        serde_json::from_value(value).map_err(Error::InvalidConfig)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl ServerConfig {
    /// The base URL, with a trailing slash so that relative paths are joined
    /// below it rather than replacing its last segment.
    pub fn base_url(&self) -> crate::Result<Url> {
        let mut base_url = self.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Url::parse(&base_url).map_err(|err| Error::InvalidUrl(base_url, err))
    }
}
