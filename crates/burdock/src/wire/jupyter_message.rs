/*
 * jupyter_message.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Serialize;

use crate::error::Error;
use crate::session::Session;
use crate::wire::comm::CommClose;
use crate::wire::comm::CommOpen;
use crate::wire::comm::CommWireMsg;
use crate::wire::header::JupyterHeader;
use crate::wire::status::KernelStatus;
use crate::wire::wire_message::Channel;
use crate::wire::wire_message::WireMessage;

/// Represents a Jupyter message
#[derive(Debug, Clone)]
pub struct JupyterMessage<T> {
    /// The header for this message
    pub header: JupyterHeader,

    /// The header of the message from which this message originated. Optional;
    /// not all messages have a parent.
    pub parent_header: Option<JupyterHeader>,

    /// The body (payload) of the message
    pub content: T,

    /// The kernel channel carrying the message
    pub channel: Channel,
}

/// Trait used to extract the wire message type from a Jupyter message
pub trait MessageType {
    fn message_type() -> String;
}

/// Convenience trait for grouping traits that must be present on all Jupyter
/// protocol messages
pub trait ProtocolMessage: MessageType + Serialize + std::fmt::Debug + Clone {}
impl<T> ProtocolMessage for T where T: MessageType + Serialize + std::fmt::Debug + Clone {}

/// List of all known/implemented messages. The inspector only ever deals with
/// comms, plus the status messages the kernel interleaves with them.
#[derive(Debug)]
pub enum Message {
    CommOpen(JupyterMessage<CommOpen>),
    CommMsg(JupyterMessage<CommWireMsg>),
    CommClose(JupyterMessage<CommClose>),
    Status(JupyterMessage<KernelStatus>),
}

/// Conversion from a `Message` to a `WireMessage`; used to send messages over a
/// transport
impl TryFrom<&Message> for WireMessage {
    type Error = crate::error::Error;

    fn try_from(msg: &Message) -> Result<Self, Error> {
        match msg {
            Message::CommOpen(msg) => WireMessage::try_from(msg),
            Message::CommMsg(msg) => WireMessage::try_from(msg),
            Message::CommClose(msg) => WireMessage::try_from(msg),
            Message::Status(msg) => WireMessage::try_from(msg),
        }
    }
}

impl TryFrom<&WireMessage> for Message {
    type Error = crate::error::Error;

    /// Converts from a wire message to a Jupyter message by examining the message
    /// type and attempting to coerce the content into the appropriate
    /// structure.
    fn try_from(msg: &WireMessage) -> Result<Self, Error> {
        let kind = msg.header.msg_type.clone();

        if kind == CommOpen::message_type() {
            return Ok(Message::CommOpen(JupyterMessage::try_from(msg)?));
        }
        if kind == CommWireMsg::message_type() {
            return Ok(Message::CommMsg(JupyterMessage::try_from(msg)?));
        }
        if kind == CommClose::message_type() {
            return Ok(Message::CommClose(JupyterMessage::try_from(msg)?));
        }
        if kind == KernelStatus::message_type() {
            return Ok(Message::Status(JupyterMessage::try_from(msg)?));
        }
        Err(Error::UnknownMessageType(kind))
    }
}

impl<T> JupyterMessage<T>
where
    T: ProtocolMessage,
{
    /// Create a new Jupyter message on the shell channel, optionally as a
    /// child (reply) to an existing message.
    pub fn create(
        content: T,
        parent: Option<JupyterHeader>,
        session: &Session,
    ) -> JupyterMessage<T> {
        JupyterMessage::<T> {
            header: JupyterHeader::create(
                T::message_type(),
                session.session_id.clone(),
                session.username.clone(),
            ),
            parent_header: parent,
            content,
            channel: Channel::Shell,
        }
    }

    /// Create a reply to this message with the given content. Replies are
    /// published on IOPub, as the kernel does for comm traffic.
    pub fn create_reply<R: ProtocolMessage>(
        &self,
        content: R,
        session: &Session,
    ) -> JupyterMessage<R> {
        // Note that the reply needs to use the replier's session (given as an
        // argument), not the requester's session (which we could otherwise
        // copy from the message itself)
        JupyterMessage::<R> {
            header: JupyterHeader::create(
                R::message_type(),
                session.session_id.clone(),
                session.username.clone(),
            ),
            parent_header: Some(self.header.clone()),
            content,
            channel: Channel::IOPub,
        }
    }
}
