/*
 * session.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use uuid::Uuid;

/// The identity stamped on every message we send: the kernel session the
/// messages belong to, and the client within that session.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub session_id: String,
    pub username: String,
}

impl Session {
    pub fn create(session_id: String, username: String) -> Self {
        Self {
            session_id,
            username,
        }
    }

    /// Creates a session identity with a fresh, process-unique client ID.
    pub fn with_new_client(session_id: String) -> Self {
        Self::create(session_id, Uuid::new_v4().to_string())
    }

    pub fn client_id(&self) -> &str {
        &self.username
    }
}
