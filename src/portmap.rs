//! PORTMAP version 2 client (component D): resolves the dynamic UDP port a
//! remote program is listening on.

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::auth::AuthFlavor;
use crate::rpc::{self, PROC_PORTMAP_GETPORT, PROGRAM_PORTMAP, VERSION_PORTMAP};
use crate::transport::UdpTransport;
use crate::Error;

const IPPROTO_UDP: u32 = 17;

/// A thin client for the subset of the portmapper protocol this crate needs:
/// `GETPORT`.
#[derive(Debug)]
pub(crate) struct PortmapClient;

impl PortmapClient {
    /// Resolves the UDP port registered for `(program, version)`, or
    /// [`Error::ProgramUnavailable`] if nothing is registered.
    pub(crate) fn get_port(
        transport: &UdpTransport,
        scratch: &mut [u8],
        xid: u32,
        retries: u32,
        program: u32,
        version: u32,
    ) -> Result<u16, Error> {
        let mut payload = Vec::with_capacity(16);
        payload.write_u32::<BigEndian>(program)?;
        payload.write_u32::<BigEndian>(version)?;
        payload.write_u32::<BigEndian>(IPPROTO_UDP)?;
        payload.write_u32::<BigEndian>(0)?;

        let reply = rpc::call(
            transport,
            scratch,
            xid,
            retries,
            PROGRAM_PORTMAP,
            VERSION_PORTMAP,
            PROC_PORTMAP_GETPORT,
            AuthFlavor::AuthNone(None),
            &payload,
        )?;

        let port = Cursor::new(reply.as_slice()).read_u32::<BigEndian>()?;
        if port == 0 || port > u16::MAX as u32 {
            return Err(Error::ProgramUnavailable);
        }

        Ok(port as u16)
    }
}
