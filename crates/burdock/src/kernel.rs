/*
 * kernel.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;

use crate::wire::comm::CommOpen;
use crate::wire::jupyter_message::JupyterMessage;
use crate::wire::wire_message::WireMessage;

/// The two halves of an open comm as seen from the frontend. `outgoing_tx`
/// carries messages to the kernel; `incoming_rx` receives everything the
/// kernel publishes for this client. The kernel side dropping its sender is
/// treated the same as a `comm_close`.
pub struct CommTransport {
    pub outgoing_tx: UnboundedSender<WireMessage>,
    pub incoming_rx: UnboundedReceiver<WireMessage>,
}

/// A live kernel session, as provided by the host application. Its lifecycle
/// and transport are owned by the host; the inspector only opens comms on it.
#[async_trait(?Send)]
pub trait KernelSession {
    /// ID of the kernel attached to the session, or `None` when there is no
    /// kernel (not started yet, or shut down).
    fn kernel_id(&self) -> Option<String>;

    /// ID of the session.
    fn session_id(&self) -> String;

    /// Sends `comm_open` and resolves once the kernel side of the comm is
    /// ready to receive messages.
    async fn connect_comm(&self, open: JupyterMessage<CommOpen>) -> anyhow::Result<CommTransport>;
}
