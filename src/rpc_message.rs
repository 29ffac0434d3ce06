//! Message framing for Open Network Computing RPC (RFC 5531) carried over
//! UDP.
//!
//! Unlike the TCP transport, a UDP datagram carries no record-marking
//! header: the datagram boundary *is* the message boundary, so a
//! [`RpcMessage`] is simply `xid | message type | body`.

use std::{
    convert::TryFrom,
    io::{Cursor, Write},
};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{reply::ReplyBody, CallBody, Error};

const MESSAGE_TYPE_CALL: u32 = 0;
const MESSAGE_TYPE_REPLY: u32 = 1;

/// The type of RPC message.
#[derive(Debug, PartialEq)]
pub enum MessageType<'a> {
    /// This message is invoking an RPC.
    Call(CallBody<'a>),
    /// This message is a response to an RPC request.
    Reply(ReplyBody<'a>),
}

impl<'a> MessageType<'a> {
    /// Constructs a new `MessageType` by parsing the wire format read from `r`.
    ///
    /// `from_cursor` advances the position of `r` to the end of the
    /// `MessageType` structure.
    pub(crate) fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        match r.read_u32::<BigEndian>()? {
            MESSAGE_TYPE_CALL => Ok(MessageType::Call(CallBody::from_cursor(r)?)),
            MESSAGE_TYPE_REPLY => Ok(MessageType::Reply(ReplyBody::from_cursor(r)?)),
            v => Err(Error::InvalidMessageType(v)),
        }
    }

    /// Serialises this `MessageType` into `buf`, advancing the cursor position
    /// by [`MessageType::serialised_len()`] bytes.
    pub fn serialise_into<W: Write>(&self, mut buf: W) -> Result<(), std::io::Error> {
        match self {
            Self::Call(b) => {
                buf.write_u32::<BigEndian>(MESSAGE_TYPE_CALL)?;
                b.serialise_into(buf)?;
            }
            Self::Reply(b) => {
                buf.write_u32::<BigEndian>(MESSAGE_TYPE_REPLY)?;
                b.serialise_into(buf)?;
            }
        }

        Ok(())
    }

    /// Returns the on-wire length of this message once serialised, excluding
    /// the leading xid.
    pub fn serialised_len(&self) -> u32 {
        match self {
            Self::Call(c) => c.serialised_len() + 4,
            Self::Reply(r) => r.serialised_len() + 4,
        }
    }
}

/// A single ONC-RPC datagram: a transaction id and either a call or a reply.
#[derive(Debug, PartialEq)]
pub struct RpcMessage<'a> {
    xid: u32,
    message_type: MessageType<'a>,
}

impl<'a> RpcMessage<'a> {
    /// Construct a new `RpcMessage` with the specified transaction ID and
    /// message body.
    pub fn new(xid: u32, message_type: MessageType<'a>) -> Self {
        Self { xid, message_type }
    }

    /// Deserialises a new [`RpcMessage`] from a complete datagram payload.
    ///
    /// `buf` must contain exactly one message; trailing or missing bytes
    /// return [`Error::IncompleteMessage`].
    pub fn from_datagram(buf: &'a [u8]) -> Result<Self, Error> {
        let mut r = Cursor::new(buf);

        let xid = r.read_u32::<BigEndian>()?;
        let message_type = MessageType::from_cursor(&mut r)?;

        let msg = RpcMessage { xid, message_type };

        if msg.serialised_len() as usize != buf.len() {
            return Err(Error::IncompleteMessage {
                buffer_len: buf.len(),
                expected: msg.serialised_len() as usize,
            });
        }

        Ok(msg)
    }

    /// Write this `RpcMessage` into `buf`, advancing the cursor to the end of
    /// the serialised message. `buf` must have capacity for at least
    /// [`RpcMessage::serialised_len()`] bytes from the current cursor
    /// position.
    ///
    /// This method allows the caller to specify the underlying buffer used to
    /// hold the serialised message to enable reuse and pooling of a single
    /// scratch buffer across calls.
    pub fn serialise_into<W: Write>(&self, mut buf: W) -> Result<(), std::io::Error> {
        buf.write_u32::<BigEndian>(self.xid)?;
        self.message_type.serialise_into(buf)
    }

    /// Serialise this `RpcMessage` into a new [`Vec`].
    pub fn serialise(&self) -> Result<Vec<u8>, std::io::Error> {
        let mut buf = Cursor::new(Vec::with_capacity(self.serialised_len() as usize));
        self.serialise_into(&mut buf)?;
        Ok(buf.into_inner())
    }

    /// Returns the on-wire length of this message once serialised.
    pub fn serialised_len(&self) -> u32 {
        // +4 for the xid
        self.message_type.serialised_len() + 4
    }

    /// The transaction ID for this request.
    pub fn xid(&self) -> u32 {
        self.xid
    }

    /// The [`MessageType`] contained in this request.
    pub fn message(&self) -> &MessageType<'a> {
        &self.message_type
    }

    /// Returns the [`CallBody`] in this request, or `None` if this message is
    /// not a RPC call request.
    pub fn call_body(&self) -> Option<&CallBody<'a>> {
        match self.message_type {
            MessageType::Call(ref b) => Some(b),
            _ => None,
        }
    }

    /// Returns the [`ReplyBody`] in this request, or `None` if this message is
    /// not a RPC response.
    pub fn reply_body(&self) -> Option<&ReplyBody<'a>> {
        match self.message_type {
            MessageType::Reply(ref b) => Some(b),
            _ => None,
        }
    }
}

impl<'a> TryFrom<&'a [u8]> for RpcMessage<'a> {
    type Error = Error;

    fn try_from(v: &'a [u8]) -> Result<Self, Self::Error> {
        RpcMessage::from_datagram(v)
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;
    use crate::{auth::AuthFlavor, AcceptedStatus};

    #[test]
    fn test_rpcmessage_auth_none_call() {
        // A GETPORT call (no record-marking header - this is the raw UDP
        // payload) carrying an empty AUTH_NONE credential and verifier.
        const RAW: [u8; 56] = hex!(
            "00000001
             00000000
             00000002
             000186a0
             00000002
             00000003
             00000000 00000000
             00000000 00000000
             000186a3 00000003 00000011 00000000"
        );

        let msg = RpcMessage::from_datagram(RAW.as_ref()).expect("failed to parse message");
        assert_eq!(msg.xid(), 1);
        assert_eq!(msg.serialised_len(), 56);

        let body = msg.call_body().expect("not a call rpc");
        assert_eq!(body.rpc_version(), 2);
        assert_eq!(body.program(), 100_000);
        assert_eq!(body.program_version(), 2);
        assert_eq!(body.procedure(), 3);
        assert_eq!(*body.auth_credentials(), AuthFlavor::AuthNone(None));
        assert_eq!(*body.auth_verifier(), AuthFlavor::AuthNone(None));
        assert_eq!(body.payload().len(), 16);

        let serialised = msg.serialise().expect("failed to serialise");
        assert_eq!(serialised.as_slice(), RAW.as_ref());
    }

    #[test]
    fn test_rpcmessage_reply_accepted() {
        const RAW: [u8; 28] = hex!(
            "00000001
             00000001
             00000000
             00000000 00000000
             00000000
             0000006f"
        );

        let msg = RpcMessage::from_datagram(RAW.as_ref()).expect("failed to parse message");
        assert_eq!(msg.xid(), 1);

        let body = match msg.reply_body().expect("not a reply") {
            ReplyBody::Accepted(b) => b,
            _ => panic!("wrong reply type"),
        };

        match body.status() {
            AcceptedStatus::Success(data) => assert_eq!(data.len(), 4),
            v => panic!("unexpected status {v:?}"),
        }

        let serialised = msg.serialise().expect("failed to serialise");
        assert_eq!(serialised.as_slice(), RAW.as_ref());
    }

    #[test]
    fn test_incomplete_message_detected() {
        const RAW: [u8; 12] = hex!("00000001 00000000 00000002");

        let err = RpcMessage::from_datagram(RAW.as_ref()).unwrap_err();
        assert!(matches!(err, Error::IncompleteMessage { .. }));
    }
}
