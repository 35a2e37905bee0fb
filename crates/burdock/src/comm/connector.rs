/*
 * connector.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::json;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::comm::base_comm::JsonRpcReply;
use crate::comm::comm_channel::InspectorComm;
use crate::comm::inspector_comm::InspectorBackendRpcRequest;
use crate::error::Error;
use crate::inspector::inspection::InspectionReply;
use crate::inspector::inspection::InspectionRequest;
use crate::kernel::KernelSession;
use crate::session::Session;
use crate::wire::comm::CommOpen;
use crate::wire::jupyter_message::JupyterMessage;

/// Sends inspection requests to a backend and returns its replies.
#[async_trait(?Send)]
pub trait InspectionConnector {
    /// Fetches the inspection result for `request`. `Ok(None)` means the
    /// backend has nothing to show at that position.
    async fn fetch(&self, request: InspectionRequest) -> crate::Result<Option<InspectionReply>>;

    /// Releases the connection to the backend. Later fetches fail.
    fn dispose(&self);
}

/// Connector speaking to the kernel of a session over a dedicated comm.
///
/// The comm is opened lazily on the first fetch and reused afterwards. It is
/// scoped to the session and to a client ID unique to this connector, so
/// two connectors on the same session never share a comm.
pub struct CommConnector {
    kernel: Rc<dyn KernelSession>,
    session: Session,
    target_name: String,
    comm: RefCell<Option<Rc<InspectorComm>>>,
    open_lock: Mutex<()>,
    disposed: Cell<bool>,
}

impl CommConnector {
    pub fn new(kernel: Rc<dyn KernelSession>, target_name: &str) -> Self {
        let session = Session::with_new_client(kernel.session_id());
        Self {
            kernel,
            session,
            target_name: String::from(target_name),
            comm: RefCell::new(None),
            open_lock: Mutex::new(()),
            disposed: Cell::new(false),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Whether a usable comm is currently cached.
    pub fn is_connected(&self) -> bool {
        self.usable_comm().is_some()
    }

    /// Returns the cached comm if it is still usable, or opens a new one.
    /// Concurrent callers share a single open.
    pub async fn ensure_comm(&self) -> crate::Result<Rc<InspectorComm>> {
        if self.disposed.get() {
            return Err(Error::Disposed);
        }
        if let Some(comm) = self.usable_comm() {
            return Ok(comm);
        }

        let _guard = self.open_lock.lock().await;

        // Another caller may have opened the comm while we were waiting
        if let Some(comm) = self.usable_comm() {
            return Ok(comm);
        }
        if self.disposed.get() {
            return Err(Error::Disposed);
        }

        // Close the stale comm before opening its replacement
        let stale = self.comm.borrow_mut().take();
        if let Some(stale) = stale {
            log::debug!("Replacing closed comm {}", stale.comm_id());
            stale.close();
        }

        let comm_id = Uuid::new_v4().to_string();
        let open = JupyterMessage::create(
            CommOpen {
                comm_id: comm_id.clone(),
                target_name: self.target_name.clone(),
                data: json!({}),
            },
            None,
            &self.session,
        );

        log::debug!(
            "Opening comm {comm_id} ('{}') for client {}",
            self.target_name,
            self.session.client_id()
        );
        let transport = match self.kernel.connect_comm(open).await {
            Ok(transport) => transport,
            Err(err) => {
                return Err(Error::CommOpenFailed(
                    self.target_name.clone(),
                    format!("{err:?}"),
                ))
            },
        };

        let comm = Rc::new(InspectorComm::start(
            comm_id,
            self.session.clone(),
            transport,
        ));

        // Disposed while the kernel was opening the comm
        if self.disposed.get() {
            comm.close();
            return Err(Error::Disposed);
        }

        *self.comm.borrow_mut() = Some(comm.clone());
        Ok(comm)
    }

    fn usable_comm(&self) -> Option<Rc<InspectorComm>> {
        self.comm
            .borrow()
            .as_ref()
            .filter(|comm| comm.is_usable())
            .cloned()
    }
}

#[async_trait(?Send)]
impl InspectionConnector for CommConnector {
    async fn fetch(&self, request: InspectionRequest) -> crate::Result<Option<InspectionReply>> {
        if self.disposed.get() {
            return Err(Error::Disposed);
        }
        if self.kernel.kernel_id().is_none() {
            return Err(Error::NoKernel);
        }

        let comm = self.ensure_comm().await?;

        let data = serde_json::to_value(InspectorBackendRpcRequest::Inspect(request))
            .map_err(Error::CannotSerialize)?;
        let reply = comm.request(data).await?;

        decode_reply(comm.comm_id(), reply)
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let comm = self.comm.borrow_mut().take();
        if let Some(comm) = comm {
            comm.close();
        }
    }
}

impl Drop for CommConnector {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn decode_reply(comm_id: &str, data: Value) -> crate::Result<Option<InspectionReply>> {
    match JsonRpcReply::parse(&data) {
        Some(JsonRpcReply::Result(result)) => match serde_json::from_value(result) {
            Ok(reply) => Ok(reply),
            Err(err) => Err(Error::MalformedReply(String::from(comm_id), data, err)),
        },
        Some(JsonRpcReply::Error(error)) => Err(Error::BackendError(error.code, error.message)),
        None => {
            let err = <serde_json::Error as serde::de::Error>::custom(
                "expected a `result` or an `error` member",
            );
            Err(Error::MalformedReply(String::from(comm_id), data, err))
        },
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_decode_reply() {
        let reply = decode_reply(
            "comm",
            json!({"result": {"data": {"text/plain": "x"}, "metadata": {"a": 1}}}),
        )
        .unwrap()
        .unwrap();
        assert_eq!(reply.data["text/plain"], json!("x"));
        assert_eq!(reply.metadata["a"], json!(1));

        assert_matches!(decode_reply("comm", json!({"result": null})), Ok(None));

        assert_matches!(
            decode_reply("comm", json!({"error": {"code": -32603, "message": "boom"}})),
            Err(Error::BackendError(-32603, message)) if message == "boom"
        );

        assert_matches!(
            decode_reply("comm", json!({"result": {"metadata": {}}})),
            Err(Error::MalformedReply(comm_id, _, _)) if comm_id == "comm"
        );
        assert_matches!(
            decode_reply("comm", json!({"status": "ok"})),
            Err(Error::MalformedReply(_, _, _))
        );
    }
}
