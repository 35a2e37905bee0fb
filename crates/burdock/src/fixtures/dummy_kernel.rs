/*
 * dummy_kernel.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;
use std::rc::Weak;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use serde_json::Value;
use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;

use crate::comm::base_comm::json_rpc_error;
use crate::comm::base_comm::json_rpc_result;
use crate::comm::base_comm::JsonRpcErrorCode;
use crate::comm::inspector_comm::InspectorBackendRpcRequest;
use crate::inspector::inspection::InspectionRequest;
use crate::kernel::CommTransport;
use crate::kernel::KernelSession;
use crate::session::Session;
use crate::wire::comm::CommClose;
use crate::wire::comm::CommOpen;
use crate::wire::comm::CommWireMsg;
use crate::wire::jupyter_message::JupyterMessage;
use crate::wire::jupyter_message::Message;
use crate::wire::jupyter_message::ProtocolMessage;
use crate::wire::status::ExecutionState;
use crate::wire::status::KernelStatus;
use crate::wire::wire_message::WireMessage;

/// How the dummy kernel answers one request: the `data` of the reply
/// `comm_msg`, sent after `delay`.
#[derive(Clone, Debug)]
pub struct DummyResponse {
    pub delay: Duration,
    pub data: Value,
}

impl DummyResponse {
    /// A reply carrying `bundle` as the inspection result.
    pub fn found(bundle: Value) -> Self {
        Self::raw(json_rpc_result(json!({ "data": bundle, "metadata": {} })))
    }

    /// A reply without result.
    pub fn not_found() -> Self {
        Self::raw(json_rpc_result(Value::Null))
    }

    pub fn error(code: JsonRpcErrorCode, message: &str) -> Self {
        Self::raw(json_rpc_error(code, String::from(message)))
    }

    /// A reply with arbitrary `data`, e.g. a malformed envelope.
    pub fn raw(data: Value) -> Self {
        Self {
            delay: Duration::ZERO,
            data,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Responder = Box<dyn Fn(&InspectionRequest) -> DummyResponse>;

/// An inspection request as received by the dummy kernel.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub at: Instant,
    pub comm_id: String,
    pub request: InspectionRequest,
}

struct OpenComm {
    comm_id: String,
    incoming_tx: UnboundedSender<WireMessage>,
}

/// An in-process kernel session serving the inspector comm. Replies are
/// published like a real kernel does: wrapped in `busy`/`idle` status
/// messages.
///
/// Must be used from within a `LocalSet`.
pub struct DummyKernel {
    this: Weak<DummyKernel>,
    kernel_id: RefCell<Option<String>>,
    session_id: String,
    session: Session,
    responder: RefCell<Responder>,
    requests: RefCell<Vec<RecordedRequest>>,
    opens: RefCell<Vec<JupyterMessage<CommOpen>>>,
    closes: RefCell<Vec<String>>,
    comms: RefCell<Vec<OpenComm>>,
    open_delay: Cell<Duration>,
    fail_open: Cell<bool>,
    noisy: Cell<bool>,
}

impl DummyKernel {
    /// A kernel answering every request with a `text/plain` description of
    /// the request.
    pub fn new() -> Rc<Self> {
        Self::with_responder(|request: &InspectionRequest| {
            DummyResponse::found(json!({
                "text/plain": format!("{}@{}", request.text, request.offset)
            }))
        })
    }

    pub fn with_responder<F>(responder: F) -> Rc<Self>
    where
        F: Fn(&InspectionRequest) -> DummyResponse + 'static,
    {
        let session_id = uuid::Uuid::new_v4().to_string();
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            kernel_id: RefCell::new(Some(uuid::Uuid::new_v4().to_string())),
            session: Session::create(session_id.clone(), String::from("kernel")),
            session_id,
            responder: RefCell::new(Box::new(responder)),
            requests: RefCell::new(Vec::new()),
            opens: RefCell::new(Vec::new()),
            closes: RefCell::new(Vec::new()),
            comms: RefCell::new(Vec::new()),
            open_delay: Cell::new(Duration::ZERO),
            fail_open: Cell::new(false),
            noisy: Cell::new(false),
        })
    }

    /// A session without kernel.
    pub fn without_kernel() -> Rc<Self> {
        let kernel = Self::new();
        kernel.set_kernel_id(None);
        kernel
    }

    pub fn set_kernel_id(&self, kernel_id: Option<String>) {
        *self.kernel_id.borrow_mut() = kernel_id;
    }

    pub fn set_responder<F>(&self, responder: F)
    where
        F: Fn(&InspectionRequest) -> DummyResponse + 'static,
    {
        *self.responder.borrow_mut() = Box::new(responder);
    }

    /// Delays the completion of `comm_open`.
    pub fn set_open_delay(&self, delay: Duration) {
        self.open_delay.set(delay);
    }

    /// Makes `comm_open` fail.
    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.set(fail);
    }

    /// Surrounds every reply with traffic the frontend must ignore: an
    /// event without parent on the comm, and a reply on another comm.
    pub fn set_noisy(&self, noisy: bool) {
        self.noisy.set(noisy);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }

    /// Number of `comm_open` received, failed ones included.
    pub fn open_count(&self) -> usize {
        self.opens.borrow().len()
    }

    pub fn opens(&self) -> Vec<JupyterMessage<CommOpen>> {
        self.opens.borrow().clone()
    }

    /// IDs of the comms closed by the frontend.
    pub fn closed_comms(&self) -> Vec<String> {
        self.closes.borrow().clone()
    }

    /// Closes all open comms from the kernel side.
    pub fn close_comms(&self) {
        let comms: Vec<OpenComm> = self.comms.borrow_mut().drain(..).collect();
        for comm in comms {
            let msg = JupyterMessage::create(
                CommClose {
                    comm_id: comm.comm_id.clone(),
                    data: json!({}),
                },
                None,
                &self.session,
            );
            send(&comm.incoming_tx, &msg);
        }
    }

    fn on_comm_msg(&self, request: JupyterMessage<CommWireMsg>, incoming_tx: &UnboundedSender<WireMessage>) {
        let comm_id = request.content.comm_id.clone();

        let response = match serde_json::from_value(request.content.data.clone()) {
            Ok(InspectorBackendRpcRequest::Inspect(params)) => {
                self.requests.borrow_mut().push(RecordedRequest {
                    at: Instant::now(),
                    comm_id: comm_id.clone(),
                    request: params.clone(),
                });
                (*self.responder.borrow())(&params)
            },
            Err(err) => DummyResponse::error(JsonRpcErrorCode::MethodNotFound, &err.to_string()),
        };

        let session = self.session.clone();
        let noisy = self.noisy.get();
        let incoming_tx = incoming_tx.clone();

        tokio::task::spawn_local(async move {
            send(
                &incoming_tx,
                &request.create_reply(
                    KernelStatus {
                        execution_state: ExecutionState::Busy,
                    },
                    &session,
                ),
            );

            tokio::time::sleep(response.delay).await;

            if noisy {
                let event = JupyterMessage::create(
                    CommWireMsg {
                        comm_id: comm_id.clone(),
                        data: json!({"method": "refresh", "params": {}}),
                    },
                    None,
                    &session,
                );
                send(&incoming_tx, &event);

                let other = request.create_reply(
                    CommWireMsg {
                        comm_id: String::from("some-other-comm"),
                        data: json_rpc_result(json!({"data": {"text/plain": "wrong comm"}})),
                    },
                    &session,
                );
                send(&incoming_tx, &other);
            }

            let reply = request.create_reply(
                CommWireMsg {
                    comm_id,
                    data: response.data,
                },
                &session,
            );
            send(&incoming_tx, &reply);

            send(
                &incoming_tx,
                &request.create_reply(
                    KernelStatus {
                        execution_state: ExecutionState::Idle,
                    },
                    &session,
                ),
            );
        });
    }
}

fn send<T: ProtocolMessage>(incoming_tx: &UnboundedSender<WireMessage>, msg: &JupyterMessage<T>) {
    match WireMessage::try_from(msg) {
        Ok(wire) => {
            // The frontend may have gone away already
            let _ = incoming_tx.send(wire);
        },
        Err(err) => log::error!("Dummy kernel can't serialize message: {err}"),
    }
}

async fn serve(
    kernel: Weak<DummyKernel>,
    comm_id: String,
    mut outgoing_rx: UnboundedReceiver<WireMessage>,
    incoming_tx: UnboundedSender<WireMessage>,
) {
    while let Some(wire) = outgoing_rx.recv().await {
        let Some(kernel) = kernel.upgrade() else {
            return;
        };
        match Message::try_from(&wire) {
            Ok(Message::CommMsg(msg)) if msg.content.comm_id == comm_id => {
                kernel.on_comm_msg(msg, &incoming_tx);
            },
            Ok(Message::CommClose(msg)) if msg.content.comm_id == comm_id => {
                kernel.closes.borrow_mut().push(comm_id.clone());
                kernel
                    .comms
                    .borrow_mut()
                    .retain(|comm| comm.comm_id != comm_id);
                return;
            },
            Ok(_) => log::warn!("Dummy kernel got unexpected {}", wire.describe()),
            Err(err) => log::warn!("Dummy kernel got invalid message: {err}"),
        }
    }
}

#[async_trait(?Send)]
impl KernelSession for DummyKernel {
    fn kernel_id(&self) -> Option<String> {
        self.kernel_id.borrow().clone()
    }

    fn session_id(&self) -> String {
        self.session_id.clone()
    }

    async fn connect_comm(&self, open: JupyterMessage<CommOpen>) -> anyhow::Result<CommTransport> {
        let comm_id = open.content.comm_id.clone();
        self.opens.borrow_mut().push(open);

        let delay = self.open_delay.get();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_open.get() {
            anyhow::bail!("No comm target registered");
        }

        let (outgoing_tx, outgoing_rx) = unbounded_channel();
        let (incoming_tx, incoming_rx) = unbounded_channel();

        self.comms.borrow_mut().push(OpenComm {
            comm_id: comm_id.clone(),
            incoming_tx: incoming_tx.clone(),
        });
        tokio::task::spawn_local(serve(self.this.clone(), comm_id, outgoing_rx, incoming_tx));

        Ok(CommTransport {
            outgoing_tx,
            incoming_rx,
        })
    }
}
