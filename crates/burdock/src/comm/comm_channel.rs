/*
 * comm_channel.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::cell::Cell;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::json;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::Error;
use crate::kernel::CommTransport;
use crate::session::Session;
use crate::wire::comm::CommClose;
use crate::wire::comm::CommWireMsg;
use crate::wire::jupyter_message::JupyterMessage;
use crate::wire::jupyter_message::Message;
use crate::wire::wire_message::WireMessage;

type PendingRequests = Rc<RefCell<HashMap<String, oneshot::Sender<crate::Result<Value>>>>>;

/// An open comm, seen from the frontend. Requests are sent as `comm_msg`
/// and matched with their reply through the parent header of the reply.
///
/// The comm owns a reader task (spawned on the current `LocalSet`) that
/// dispatches incoming messages to pending requests. Once the kernel closes
/// the comm, or drops its end of the transport, the comm is no longer usable
/// and all pending requests fail with [`Error::CommClosed`].
pub struct InspectorComm {
    comm_id: String,
    session: Session,
    outgoing_tx: UnboundedSender<WireMessage>,
    pending: PendingRequests,
    closed: Rc<Cell<bool>>,
    reader: JoinHandle<()>,
}

impl InspectorComm {
    /// Starts the reader task for a freshly opened comm. Must be called from
    /// within a `LocalSet`.
    pub fn start(comm_id: String, session: Session, transport: CommTransport) -> Self {
        let pending: PendingRequests = Rc::new(RefCell::new(HashMap::new()));
        let closed = Rc::new(Cell::new(false));

        let reader = tokio::task::spawn_local(read_incoming(
            comm_id.clone(),
            transport.incoming_rx,
            pending.clone(),
            closed.clone(),
        ));

        Self {
            comm_id,
            session,
            outgoing_tx: transport.outgoing_tx,
            pending,
            closed,
            reader,
        }
    }

    pub fn comm_id(&self) -> &str {
        &self.comm_id
    }

    /// Whether requests can still be sent on this comm.
    pub fn is_usable(&self) -> bool {
        !self.closed.get() && !self.outgoing_tx.is_closed()
    }

    /// Sends `data` to the kernel and waits for the `data` of the reply.
    pub async fn request(&self, data: Value) -> crate::Result<Value> {
        if !self.is_usable() {
            return Err(Error::CommClosed(self.comm_id.clone()));
        }

        let msg = JupyterMessage::create(
            CommWireMsg {
                comm_id: self.comm_id.clone(),
                data,
            },
            None,
            &self.session,
        );
        let msg_id = msg.header.msg_id.clone();
        let wire = WireMessage::try_from(&msg)?;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.borrow_mut().insert(msg_id.clone(), reply_tx);

        log::trace!(
            "Sending {} on comm {} (request {msg_id})",
            wire.describe(),
            self.comm_id
        );
        if self.outgoing_tx.send(wire).is_err() {
            self.pending.borrow_mut().remove(&msg_id);
            return Err(Error::CannotSend(self.comm_id.clone()));
        }

        match reply_rx.await {
            Ok(reply) => reply,
            // The reader went away without answering
            Err(_) => Err(Error::CommClosed(self.comm_id.clone())),
        }
    }

    /// Closes the comm from our side: notifies the kernel with `comm_close`,
    /// stops the reader and fails pending requests. Idempotent.
    pub fn close(&self) {
        if self.closed.replace(true) {
            return;
        }

        let msg = JupyterMessage::create(
            CommClose {
                comm_id: self.comm_id.clone(),
                data: json!({}),
            },
            None,
            &self.session,
        );
        match WireMessage::try_from(&msg) {
            Ok(wire) => {
                if self.outgoing_tx.send(wire).is_err() {
                    log::trace!("Kernel end of comm {} already gone", self.comm_id);
                }
            },
            Err(err) => log::warn!("Can't create `comm_close` for {}: {err}", self.comm_id),
        }

        self.reader.abort();
        fail_pending(&self.pending, &self.comm_id);
        log::debug!("Closed comm {}", self.comm_id);
    }
}

impl Drop for InspectorComm {
    fn drop(&mut self) {
        self.close();
    }
}

async fn read_incoming(
    comm_id: String,
    mut incoming_rx: UnboundedReceiver<WireMessage>,
    pending: PendingRequests,
    closed: Rc<Cell<bool>>,
) {
    while let Some(wire) = incoming_rx.recv().await {
        match Message::try_from(&wire) {
            Ok(Message::CommMsg(msg)) => {
                if msg.content.comm_id != comm_id {
                    log::trace!("Ignoring message for comm {}", msg.content.comm_id);
                    continue;
                }
                let Some(parent) = msg.parent_header else {
                    log::trace!("Ignoring event on comm {comm_id}: {}", wire.describe());
                    continue;
                };
                let Some(reply_tx) = pending.borrow_mut().remove(&parent.msg_id) else {
                    log::trace!("No pending request for reply to {}", parent.msg_id);
                    continue;
                };
                // The requester may have given up already
                let _ = reply_tx.send(Ok(msg.content.data));
            },

            Ok(Message::CommClose(msg)) if msg.content.comm_id == comm_id => {
                log::info!("Comm {comm_id} closed by the kernel");
                break;
            },

            Ok(_) => {
                log::trace!("Ignoring {} on comm {comm_id}", wire.describe());
            },

            Err(Error::UnknownMessageType(kind)) => {
                log::trace!("Ignoring '{kind}' message on comm {comm_id}");
            },

            Err(err) => {
                // A reply we can't decode still settles its request
                let reply_tx = wire
                    .parent_id()
                    .and_then(|parent_id| pending.borrow_mut().remove(parent_id));
                match reply_tx {
                    Some(reply_tx) => {
                        let _ = reply_tx.send(Err(err));
                    },
                    None => log::warn!("Discarding malformed message on comm {comm_id}: {err}"),
                }
            },
        }
    }

    closed.set(true);
    fail_pending(&pending, &comm_id);
}

fn fail_pending(pending: &PendingRequests, comm_id: &str) {
    let senders: Vec<_> = pending.borrow_mut().drain().collect();
    for (msg_id, reply_tx) in senders {
        log::trace!("Failing request {msg_id}: comm {comm_id} closed");
        let _ = reply_tx.send(Err(Error::CommClosed(String::from(comm_id))));
    }
}
