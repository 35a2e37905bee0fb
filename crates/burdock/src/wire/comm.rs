/*
 * comm.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

//! Bodies of the three messages making up the life of a comm: `comm_open`
//! from the frontend, `comm_msg` in both directions, and `comm_close` from
//! either side.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::wire::jupyter_message::MessageType;

/// Asks the kernel to open a comm with the handler registered for
/// `target_name`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommOpen {
    pub comm_id: String,
    pub target_name: String,
    pub data: Value,
}

/// Payload exchanged on an open comm. Requests and their replies both travel
/// as `comm_msg`, the reply pointing at the request through its parent
/// header.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommWireMsg {
    pub comm_id: String,
    pub data: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommClose {
    pub comm_id: String,

    // Kernels are allowed to leave it out
    #[serde(default)]
    pub data: Value,
}

impl MessageType for CommOpen {
    fn message_type() -> String {
        String::from("comm_open")
    }
}

impl MessageType for CommWireMsg {
    fn message_type() -> String {
        String::from("comm_msg")
    }
}

impl MessageType for CommClose {
    fn message_type() -> String {
        String::from("comm_close")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_comm_open_carries_target() {
        let open = CommOpen {
            comm_id: String::from("c1"),
            target_name: String::from("burdock"),
            data: json!({}),
        };
        assert_eq!(
            serde_json::to_value(&open).unwrap(),
            json!({"comm_id": "c1", "target_name": "burdock", "data": {}})
        );
    }

    #[test]
    fn test_comm_close_without_data() {
        let close: CommClose = serde_json::from_value(json!({"comm_id": "c1"})).unwrap();
        assert_eq!(close.comm_id, "c1");
        assert!(close.data.is_null());
    }
}
