/*
 * mod.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

pub mod base_comm;
pub mod comm_channel;
pub mod connector;
pub mod inspector_comm;
