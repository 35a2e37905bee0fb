/*
 * error.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::fmt;

#[derive(Debug)]
pub enum Error {
    NoKernel,
    Disposed,
    CommOpenFailed(String, String),
    CommClosed(String),
    CannotSend(String),
    CannotSerialize(serde_json::Error),
    MalformedReply(String, serde_json::Value, serde_json::Error),
    BackendError(i64, String),
    InvalidMessage(String, serde_json::Value, serde_json::Error),
    UnknownMessageType(String),
    RenderFailed(String, anyhow::Error),
    UnknownMimeType(String),
    InvalidConfig(serde_json::Error),
    InvalidUrl(String, url::ParseError),
    KernelNotFound(String),
    InvalidKernelId(String),
    Http(String, reqwest::Error),
    LogFile(String, std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NoKernel => {
                write!(f, "No kernel is attached to the session")
            },
            Error::Disposed => {
                write!(f, "The connector has been disposed")
            },
            Error::CommOpenFailed(target, err) => {
                write!(f, "Could not open comm with target '{}': {}", target, err)
            },
            Error::CommClosed(comm_id) => {
                write!(f, "Comm '{}' closed before a reply arrived", comm_id)
            },
            Error::CannotSend(comm_id) => {
                write!(f, "Cannot send message on comm '{}'", comm_id)
            },
            Error::CannotSerialize(err) => {
                write!(f, "Cannot serialize message: {}", err)
            },
            Error::MalformedReply(comm_id, json, err) => {
                write!(
                    f,
                    "Malformed reply on comm '{}': {} (raw: {})",
                    comm_id, err, json
                )
            },
            Error::BackendError(code, message) => {
                write!(f, "Kernel returned error {}: {}", code, message)
            },
            Error::InvalidMessage(kind, json, err) => {
                write!(f, "Invalid '{}' message: {} (raw: {})", kind, err, json)
            },
            Error::UnknownMessageType(kind) => {
                write!(f, "Unknown message type '{}'", kind)
            },
            Error::RenderFailed(mime_type, err) => {
                write!(f, "Could not render '{}' payload: {}", mime_type, err)
            },
            Error::UnknownMimeType(mime_type) => {
                write!(f, "No renderer is registered for '{}'", mime_type)
            },
            Error::InvalidConfig(err) => {
                write!(f, "Invalid inspector configuration: {}", err)
            },
            Error::InvalidUrl(url, err) => {
                write!(f, "Invalid URL '{}': {}", url, err)
            },
            Error::KernelNotFound(kernel_id) => {
                write!(f, "Kernel with id {} not found.", kernel_id)
            },
            Error::InvalidKernelId(kernel_id) => {
                write!(f, "Invalid kernel id '{}'", kernel_id)
            },
            Error::Http(url, err) => {
                write!(f, "HTTP request to '{}' failed: {}", url, err)
            },
            Error::LogFile(path, err) => {
                write!(f, "Could not open log file '{}': {}", path, err)
            },
        }
    }
}

impl std::error::Error for Error {}
