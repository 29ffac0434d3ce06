//! Shared glue between the NFS-specific clients (portmap, mount, nfs3) and
//! the generic RPC framer/transceiver: build a CALL, send it, and classify
//! the REPLY.

use std::io::Cursor;

use crate::auth::AuthFlavor;
use crate::errors::RpcAcceptedError;
use crate::reply::ReplyBody;
use crate::transport::UdpTransport;
use crate::{AcceptedStatus, CallBody, Error, MessageType, RpcMessage};

pub(crate) const PROGRAM_PORTMAP: u32 = 100_000;
pub(crate) const VERSION_PORTMAP: u32 = 2;
pub(crate) const PROC_PORTMAP_GETPORT: u32 = 3;

pub(crate) const PROGRAM_MOUNT: u32 = 100_005;
pub(crate) const VERSION_MOUNT: u32 = 3;
pub(crate) const PROC_MOUNT_MNT: u32 = 1;
pub(crate) const PROC_MOUNT_UMNT: u32 = 3;

pub(crate) const PROGRAM_NFS: u32 = 100_003;
pub(crate) const VERSION_NFS: u32 = 3;

/// Builds a CALL message into `scratch`, sends it, awaits a matching reply
/// and returns a copy of the accepted reply payload.
///
/// A copy is taken because `scratch` is reused for the next call on this
/// mount, which may happen before the caller has finished decoding this
/// reply (e.g. mid chunked-read loop).
#[allow(clippy::too_many_arguments)]
pub(crate) fn call(
    transport: &UdpTransport,
    scratch: &mut [u8],
    xid: u32,
    retries: u32,
    program: u32,
    version: u32,
    procedure: u32,
    auth: AuthFlavor<&[u8]>,
    payload: &[u8],
) -> Result<Vec<u8>, Error> {
    let call_body = CallBody::new(
        program,
        version,
        procedure,
        auth,
        AuthFlavor::AuthNone(None),
        payload,
    );
    let msg = RpcMessage::new(xid, MessageType::Call(call_body));

    let request_len = {
        let mut cursor = Cursor::new(&mut scratch[..]);
        msg.serialise_into(&mut cursor).map_err(|e| {
            if e.kind() == std::io::ErrorKind::WriteZero {
                Error::BufferOverflow
            } else {
                Error::from(e)
            }
        })?;
        cursor.position() as usize
    };

    let recv_len = transport.send_recv(scratch, request_len, xid, retries)?;
    let reply = RpcMessage::from_datagram(&scratch[..recv_len])?;

    match reply.message() {
        MessageType::Reply(ReplyBody::Accepted(accepted)) => match accepted.status() {
            AcceptedStatus::Success(data) => Ok(data.to_vec()),
            AcceptedStatus::ProgramUnavailable => {
                Err(Error::RpcAccepted(RpcAcceptedError::ProgramUnavailable))
            }
            AcceptedStatus::ProgramMismatch { low, high } => {
                Err(Error::RpcAccepted(RpcAcceptedError::ProgramMismatch {
                    low: *low,
                    high: *high,
                }))
            }
            AcceptedStatus::ProcedureUnavailable => {
                Err(Error::RpcAccepted(RpcAcceptedError::ProcedureUnavailable))
            }
            AcceptedStatus::GarbageArgs => Err(Error::RpcAccepted(RpcAcceptedError::GarbageArgs)),
            AcceptedStatus::SystemError => Err(Error::RpcAccepted(RpcAcceptedError::SystemError)),
        },
        MessageType::Reply(ReplyBody::Denied(rejected)) => {
            Err(Error::RpcRejected(rejected.clone()))
        }
        MessageType::Call(_) => Err(Error::InvalidMessageType(1)),
    }
}
