/*
 * mod.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

pub mod dummy_editor;
pub mod dummy_host;
pub mod dummy_kernel;
pub mod dummy_renderer;
