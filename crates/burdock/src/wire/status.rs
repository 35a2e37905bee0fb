/*
 * status.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::wire::jupyter_message::MessageType;

/// Represents a message the kernel sends to all clients to indicate its
/// execution status.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KernelStatus {
    pub execution_state: ExecutionState,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionState {
    Busy,
    Idle,
    Starting,
}

impl MessageType for KernelStatus {
    fn message_type() -> String {
        String::from("status")
    }
}
