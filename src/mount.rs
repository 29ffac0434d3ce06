//! MOUNT version 3 client (component E): `MNT` and `UMNT` against the
//! mount daemon.

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt};

use crate::auth::AuthFlavor;
use crate::rpc::{self, PROC_MOUNT_MNT, PROC_MOUNT_UMNT, PROGRAM_MOUNT, VERSION_MOUNT};
use crate::transport::UdpTransport;
use crate::xdr::write_name;
use crate::{Error, FileHandle};

/// The result of a successful `MNT` call: the root filehandle of the
/// exported file system.
#[derive(Debug, Clone)]
pub struct MountPoint {
    /// The root filehandle returned by the server for this export.
    pub root: FileHandle,
}

/// A thin client for the `MNT`/`UMNT` procedures of the MOUNT protocol.
#[derive(Debug)]
pub(crate) struct MountClient;

impl MountClient {
    /// Mounts `export_path` on the remote mount daemon, returning the root
    /// filehandle on success or [`Error::MountFailed`] with the server's
    /// `mountstat3` code otherwise.
    pub(crate) fn mount(
        transport: &UdpTransport,
        scratch: &mut [u8],
        xid: u32,
        retries: u32,
        auth: AuthFlavor<&[u8]>,
        export_path: &str,
    ) -> Result<MountPoint, Error> {
        let mut payload = Vec::with_capacity(export_path.len() + 8);
        write_name(&mut payload, export_path)?;

        let reply = rpc::call(
            transport,
            scratch,
            xid,
            retries,
            PROGRAM_MOUNT,
            VERSION_MOUNT,
            PROC_MOUNT_MNT,
            auth,
            &payload,
        )?;

        let mut c = Cursor::new(reply.as_slice());
        let status = c.read_u32::<BigEndian>()?;
        if status != 0 {
            return Err(Error::MountFailed(status));
        }

        let root = FileHandle::from_cursor(&mut c)?;
        // The trailing auth_flavors array is ignored: AUTH_SYS is assumed
        // supported.

        Ok(MountPoint { root })
    }

    /// Unmounts `export_path` from the remote mount daemon. Failures here
    /// are the caller's responsibility to log; server-side cleanup of a
    /// missing `UMNT` is the server's problem, not this client's.
    pub(crate) fn unmount(
        transport: &UdpTransport,
        scratch: &mut [u8],
        xid: u32,
        retries: u32,
        auth: AuthFlavor<&[u8]>,
        export_path: &str,
    ) -> Result<(), Error> {
        let mut payload = Vec::with_capacity(export_path.len() + 8);
        write_name(&mut payload, export_path)?;

        rpc::call(
            transport,
            scratch,
            xid,
            retries,
            PROGRAM_MOUNT,
            VERSION_MOUNT,
            PROC_MOUNT_UMNT,
            auth,
            &payload,
        )?;

        Ok(())
    }
}
