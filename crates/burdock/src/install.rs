/*
 * install.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::config::ServerConfig;
use crate::error::Error;

/// Client for the server extension that installs the inspection agent in a
/// kernel. Inspection requests only get answers from kernels where the
/// agent is installed.
pub struct InstallClient {
    client: reqwest::Client,
    base_url: Url,
    extension: String,
}

/// Body of `GET api/<extension>/<kernel_id>`. Older servers answer with a
/// bare boolean.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstallStatus {
    Flag(bool),
    Model { installed: bool },
}

impl InstallStatus {
    fn installed(&self) -> bool {
        match self {
            InstallStatus::Flag(installed) => *installed,
            InstallStatus::Model { installed } => *installed,
        }
    }
}

impl InstallClient {
    pub fn new(config: &ServerConfig) -> crate::Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url()?,
            extension: config.extension.clone(),
        })
    }

    /// Whether the agent is installed in the kernel `kernel_id`.
    pub async fn is_installed(&self, kernel_id: &str) -> crate::Result<bool> {
        let url = self.endpoint(&["api", &self.extension, kernel_id])?;
        log::trace!("Checking agent installation at {url}");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| Error::Http(url.to_string(), err))?;
        let response = check_status(response, kernel_id, &url)?;

        let status: InstallStatus = response
            .json()
            .await
            .map_err(|err| Error::Http(url.to_string(), err))?;
        Ok(status.installed())
    }

    /// Asks the server to install the agent in the kernel `kernel_id`.
    pub async fn install(&self, kernel_id: &str) -> crate::Result<()> {
        let url = self.endpoint(&["api", &self.extension])?;
        log::info!("Installing inspection agent in kernel {kernel_id}");

        let response = self
            .client
            .post(url.clone())
            .json(&json!({ "kernelId": kernel_id }))
            .send()
            .await
            .map_err(|err| Error::Http(url.to_string(), err))?;
        check_status(response, kernel_id, &url)?;

        Ok(())
    }

    /// URL of `segments` below the base URL. Segments are percent-encoded,
    /// so a kernel id can't point the request at another endpoint.
    fn endpoint(&self, segments: &[&str]) -> crate::Result<Url> {
        if let Some(segment) = segments
            .iter()
            .find(|segment| matches!(**segment, "" | "." | ".."))
        {
            return Err(Error::InvalidKernelId(String::from(*segment)));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::InvalidUrl(
                    self.base_url.to_string(),
                    url::ParseError::RelativeUrlWithCannotBeABaseBase,
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn check_status(
    response: reqwest::Response,
    kernel_id: &str,
    url: &Url,
) -> crate::Result<reqwest::Response> {
    if response.status() == StatusCode::NOT_FOUND {
        return Err(Error::KernelNotFound(String::from(kernel_id)));
    }
    response
        .error_for_status()
        .map_err(|err| Error::Http(url.to_string(), err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_status_shapes() {
        let status: InstallStatus = serde_json::from_str("true").unwrap();
        assert!(status.installed());

        let status: InstallStatus = serde_json::from_str(r#"{"installed": false}"#).unwrap();
        assert!(!status.installed());

        assert!(serde_json::from_str::<InstallStatus>(r#"{"msg": "nope!"}"#).is_err());
    }

    #[test]
    fn test_endpoints_are_below_base_url() {
        let config = ServerConfig {
            base_url: String::from("http://localhost:8888/lab"),
            extension: String::from("burdock"),
        };
        let client = InstallClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(&["api", "burdock", "abc"]).unwrap().as_str(),
            "http://localhost:8888/lab/api/burdock/abc"
        );
    }

    #[test]
    fn test_kernel_ids_stay_in_their_segment() {
        let client = InstallClient::new(&ServerConfig::default()).unwrap();
        assert_eq!(
            client
                .endpoint(&["api", "burdock", "../../login?next=x"])
                .unwrap()
                .as_str(),
            "http://localhost:8888/api/burdock/..%2F..%2Flogin%3Fnext=x"
        );

        for kernel_id in ["", ".", ".."] {
            assert_matches::assert_matches!(
                client.endpoint(&["api", "burdock", kernel_id]),
                Err(Error::InvalidKernelId(id)) if id == kernel_id
            );
        }
    }
}
