/*
 * lib.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

pub mod comm;
pub mod config;
pub mod editor;
pub mod error;
pub mod fixtures;
pub mod inspector;
pub mod install;
pub mod kernel;
pub mod logger;
pub mod registry;
pub mod rendermime;
pub mod session;
pub mod signal;
pub mod switchboard;
pub mod wire;

pub use error::Error;
pub type Result<T> = std::result::Result<T, error::Error>;
