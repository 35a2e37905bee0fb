/*
 * inspector_comm.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;

use crate::inspector::inspection::InspectionRequest;

/**
 * Backend RPC request types for the inspector comm
 */
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", content = "params")]
pub enum InspectorBackendRpcRequest {
    /// Inspect the value under the cursor.
    ///
    /// The kernel answers with a MIME bundle describing the value, or with
    /// `null` when there is nothing to inspect at that position.
    #[serde(rename = "inspect")]
    Inspect(InspectionRequest),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_inspect_request_shape() {
        let request = InspectorBackendRpcRequest::Inspect(InspectionRequest {
            text: String::from("df.he"),
            offset: 5,
        });
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"method": "inspect", "params": {"text": "df.he", "offset": 5}})
        );
    }
}
