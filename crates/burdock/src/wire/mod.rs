/*
 * mod.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

pub mod comm;
pub mod header;
pub mod jupyter_message;
pub mod status;
pub mod wire_message;
