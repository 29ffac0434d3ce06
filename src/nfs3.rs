//! NFS version 3 client (component F, RFC 1813): encodes every procedure
//! this crate uses and decodes its reply into a typed result.
//!
//! Every call begins with a filehandle argument (where applicable) and
//! every reply begins with a `nfsstat3` status word; a non-zero status is
//! propagated as [`Error::NfsError`].

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::auth::AuthFlavor;
use crate::rpc::{self, PROGRAM_NFS, VERSION_NFS};
use crate::transport::UdpTransport;
use crate::xdr::{name_len, read_name, write_name, MAX_FILENAME_LENGTH};
use crate::{Error, Fattr3, FileHandle, Sattr3};

const PROC_GETATTR: u32 = 1;
const PROC_LOOKUP: u32 = 3;
const PROC_READ: u32 = 6;
const PROC_WRITE: u32 = 7;
const PROC_CREATE: u32 = 8;
const PROC_MKDIR: u32 = 9;
const PROC_REMOVE: u32 = 12;
const PROC_RMDIR: u32 = 13;
const PROC_RENAME: u32 = 14;
const PROC_READDIRPLUS: u32 = 17;
const PROC_FSINFO: u32 = 19;
const PROC_COMMIT: u32 = 21;

/// How the server should handle the data in a `WRITE` call.
///
/// This client always sends [`StableHow::Unstable`] and relies on an
/// explicit `COMMIT` at close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StableHow {
    Unstable = 0,
    DataSync = 1,
    FileSync = 2,
}

/// The `createmode3` values this client uses to select `CREATE` semantics.
///
/// `EXCLUSIVE` (value 2) is not modelled: its wire format replaces `sattr3`
/// with an 8-byte `createverf3` and requires a follow-up `SETATTR` to apply
/// attributes, which this client's LOOKUP-then-CREATE open contract has no
/// use for (existence is already determined before the `CREATE` call).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CreateMode {
    Unchecked = 0,
    Guarded = 1,
}

/// Server-advertised I/O sizing, returned by `FSINFO` and used to pick
/// chunk sizes for `READ`/`WRITE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsInfo {
    /// Maximum size of a READ request the server will accept.
    pub rtmax: u32,
    /// Preferred size of a READ request.
    pub rtpref: u32,
    /// Suggested READ size multiple.
    pub rtmult: u32,
    /// Maximum size of a WRITE request the server will accept.
    pub wtmax: u32,
    /// Preferred size of a WRITE request.
    pub wtpref: u32,
    /// Suggested WRITE size multiple.
    pub wtmult: u32,
    /// Preferred size of a READDIRPLUS request.
    pub dtpref: u32,
}

/// The decoded reply to a `WRITE` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WriteResult {
    pub(crate) count: u32,
    pub(crate) committed: StableHow,
    pub(crate) verifier: u64,
}

/// The decoded reply to a `READ` call. `data` is a copy of the bytes
/// returned, taken out of the scratch buffer before it is reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReadResult {
    pub(crate) data: Vec<u8>,
    pub(crate) eof: bool,
}

/// A single entry yielded by `READDIRPLUS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DirPlusEntry {
    pub(crate) name: String,
    pub(crate) file_id: u64,
    pub(crate) handle: Option<FileHandle>,
    pub(crate) attrs: Option<Fattr3>,
}

/// One page of a `READDIRPLUS` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReadDirPlusResult {
    pub(crate) entries: Vec<DirPlusEntry>,
    pub(crate) cookie: u64,
    pub(crate) cookieverf: u64,
    pub(crate) eof: bool,
}

/// Call context shared by every `NFSv3` procedure: the transport, mount
/// credentials and retry budget. Borrowed for the duration of a single call.
pub(crate) struct Nfs3Call<'a> {
    pub(crate) transport: &'a UdpTransport,
    pub(crate) scratch: &'a mut [u8],
    pub(crate) xid: u32,
    pub(crate) retries: u32,
    pub(crate) auth: AuthFlavor<&'a [u8]>,
}

impl<'a> Nfs3Call<'a> {
    fn invoke(&mut self, procedure: u32, payload: &[u8]) -> Result<Vec<u8>, Error> {
        rpc::call(
            self.transport,
            self.scratch,
            self.xid,
            self.retries,
            PROGRAM_NFS,
            VERSION_NFS,
            procedure,
            self.auth.clone(),
            payload,
        )
    }
}

fn check_status(c: &mut Cursor<&[u8]>) -> Result<(), Error> {
    let status = c.read_u32::<BigEndian>()?;
    if status != 0 {
        return Err(Error::NfsError(status));
    }
    Ok(())
}

/// `GETATTR(fh) -> attrs`.
pub(crate) fn getattr(call: &mut Nfs3Call<'_>, fh: &FileHandle) -> Result<Fattr3, Error> {
    let mut payload = Vec::new();
    fh.serialise_into(&mut payload)?;

    let reply = call.invoke(PROC_GETATTR, &payload)?;
    let mut c = Cursor::new(reply.as_slice());
    check_status(&mut c)?;
    Fattr3::from_cursor(&mut c)
}

/// `LOOKUP(dir_fh, name) -> (fh, attrs?, dir_attrs?)`.
pub(crate) fn lookup(
    call: &mut Nfs3Call<'_>,
    dir_fh: &FileHandle,
    name: &str,
) -> Result<(FileHandle, Option<Fattr3>), Error> {
    let mut payload = Vec::with_capacity(dir_fh.serialised_len() as usize + name_len(name) as usize);
    dir_fh.serialise_into(&mut payload)?;
    write_name(&mut payload, name)?;

    let reply = call.invoke(PROC_LOOKUP, &payload)?;
    let mut c = Cursor::new(reply.as_slice());
    check_status(&mut c)?;

    let fh = FileHandle::from_cursor(&mut c)?;
    let attrs = Fattr3::from_optional_cursor(&mut c)?;
    // Trailing dir_attributes (post-op) are not needed by this client.

    Ok((fh, attrs))
}

/// `FSINFO(root_fh) -> FsInfo`.
pub(crate) fn fsinfo(call: &mut Nfs3Call<'_>, root_fh: &FileHandle) -> Result<FsInfo, Error> {
    let mut payload = Vec::new();
    root_fh.serialise_into(&mut payload)?;

    let reply = call.invoke(PROC_FSINFO, &payload)?;
    let mut c = Cursor::new(reply.as_slice());
    check_status(&mut c)?;

    // Skip the leading obj_attributes (post-op attr).
    Fattr3::from_optional_cursor(&mut c)?;

    let rtmax = c.read_u32::<BigEndian>()?;
    let rtpref = c.read_u32::<BigEndian>()?;
    let rtmult = c.read_u32::<BigEndian>()?;
    let wtmax = c.read_u32::<BigEndian>()?;
    let wtpref = c.read_u32::<BigEndian>()?;
    let wtmult = c.read_u32::<BigEndian>()?;
    let dtpref = c.read_u32::<BigEndian>()?;

    Ok(FsInfo {
        rtmax,
        rtpref,
        rtmult,
        wtmax,
        wtpref,
        wtmult,
        dtpref,
    })
}

/// `CREATE(dir_fh, name, mode, sattr) -> fh`.
pub(crate) fn create(
    call: &mut Nfs3Call<'_>,
    dir_fh: &FileHandle,
    name: &str,
    mode: CreateMode,
    attrs: &Sattr3,
) -> Result<FileHandle, Error> {
    let mut payload = Vec::with_capacity(
        dir_fh.serialised_len() as usize + name_len(name) as usize + 4 + attrs.serialised_len() as usize,
    );
    dir_fh.serialise_into(&mut payload)?;
    write_name(&mut payload, name)?;
    payload.write_u32::<BigEndian>(mode as u32)?;
    attrs.serialise_into(&mut payload)?;

    let reply = call.invoke(PROC_CREATE, &payload)?;
    let mut c = Cursor::new(reply.as_slice());
    check_status(&mut c)?;

    // handle is itself optional (post_op_fh3); this client always asks for
    // a handle and treats its absence as a protocol violation.
    if c.read_u32::<BigEndian>()? == 0 {
        return Err(Error::Invalid);
    }
    FileHandle::from_cursor(&mut c)
}

/// `MKDIR(dir_fh, name, sattr) -> fh`.
pub(crate) fn mkdir(
    call: &mut Nfs3Call<'_>,
    dir_fh: &FileHandle,
    name: &str,
    attrs: &Sattr3,
) -> Result<FileHandle, Error> {
    let mut payload = Vec::with_capacity(
        dir_fh.serialised_len() as usize + name_len(name) as usize + attrs.serialised_len() as usize,
    );
    dir_fh.serialise_into(&mut payload)?;
    write_name(&mut payload, name)?;
    attrs.serialise_into(&mut payload)?;

    let reply = call.invoke(PROC_MKDIR, &payload)?;
    let mut c = Cursor::new(reply.as_slice());
    check_status(&mut c)?;

    if c.read_u32::<BigEndian>()? == 0 {
        return Err(Error::Invalid);
    }
    FileHandle::from_cursor(&mut c)
}

/// `REMOVE(dir_fh, name)`.
pub(crate) fn remove(call: &mut Nfs3Call<'_>, dir_fh: &FileHandle, name: &str) -> Result<(), Error> {
    let mut payload = Vec::new();
    dir_fh.serialise_into(&mut payload)?;
    write_name(&mut payload, name)?;

    let reply = call.invoke(PROC_REMOVE, &payload)?;
    check_status(&mut Cursor::new(reply.as_slice()))
}

/// `RMDIR(dir_fh, name)`.
pub(crate) fn rmdir(call: &mut Nfs3Call<'_>, dir_fh: &FileHandle, name: &str) -> Result<(), Error> {
    let mut payload = Vec::new();
    dir_fh.serialise_into(&mut payload)?;
    write_name(&mut payload, name)?;

    let reply = call.invoke(PROC_RMDIR, &payload)?;
    check_status(&mut Cursor::new(reply.as_slice()))
}

/// `RENAME(from_dir_fh, from_name, to_dir_fh, to_name)`.
pub(crate) fn rename(
    call: &mut Nfs3Call<'_>,
    from_dir_fh: &FileHandle,
    from_name: &str,
    to_dir_fh: &FileHandle,
    to_name: &str,
) -> Result<(), Error> {
    let mut payload = Vec::new();
    from_dir_fh.serialise_into(&mut payload)?;
    write_name(&mut payload, from_name)?;
    to_dir_fh.serialise_into(&mut payload)?;
    write_name(&mut payload, to_name)?;

    let reply = call.invoke(PROC_RENAME, &payload)?;
    check_status(&mut Cursor::new(reply.as_slice()))
}

/// `COMMIT(fh, offset=0, count=0)`.
pub(crate) fn commit(call: &mut Nfs3Call<'_>, fh: &FileHandle) -> Result<(), Error> {
    let mut payload = Vec::new();
    fh.serialise_into(&mut payload)?;
    payload.write_u64::<BigEndian>(0)?;
    payload.write_u32::<BigEndian>(0)?;

    let reply = call.invoke(PROC_COMMIT, &payload)?;
    check_status(&mut Cursor::new(reply.as_slice()))
}

/// `READ(fh, offset, count) -> (data, eof)`.
pub(crate) fn read(
    call: &mut Nfs3Call<'_>,
    fh: &FileHandle,
    offset: u64,
    count: u32,
) -> Result<ReadResult, Error> {
    let mut payload = Vec::new();
    fh.serialise_into(&mut payload)?;
    payload.write_u64::<BigEndian>(offset)?;
    payload.write_u32::<BigEndian>(count)?;

    let reply = call.invoke(PROC_READ, &payload)?;
    let mut c = Cursor::new(reply.as_slice());
    check_status(&mut c)?;

    // post_op_attr for the file, which this client does not need.
    Fattr3::from_optional_cursor(&mut c)?;

    let returned_count = c.read_u32::<BigEndian>()?;
    let eof = c.read_u32::<BigEndian>()? != 0;

    let data = crate::Opaque::<&[u8]>::from_wire(&mut c, returned_count as usize)?.into_inner();

    Ok(ReadResult {
        data: data.to_vec(),
        eof,
    })
}

/// `WRITE(fh, offset, count, UNSTABLE, data) -> (count, committed, verf)`.
pub(crate) fn write(
    call: &mut Nfs3Call<'_>,
    fh: &FileHandle,
    offset: u64,
    data: &[u8],
) -> Result<WriteResult, Error> {
    let mut payload = Vec::new();
    fh.serialise_into(&mut payload)?;
    payload.write_u64::<BigEndian>(offset)?;
    payload.write_u32::<BigEndian>(data.len() as u32)?;
    payload.write_u32::<BigEndian>(StableHow::Unstable as u32)?;
    crate::Opaque::from_user_payload(data).serialise_into(&mut payload)?;

    let reply = call.invoke(PROC_WRITE, &payload)?;
    let mut c = Cursor::new(reply.as_slice());
    check_status(&mut c)?;

    // file_wcc: pre/post op attrs, both optional.
    skip_wcc_data(&mut c)?;

    let count = c.read_u32::<BigEndian>()?;
    let committed = match c.read_u32::<BigEndian>()? {
        0 => StableHow::Unstable,
        1 => StableHow::DataSync,
        _ => StableHow::FileSync,
    };
    let verifier = c.read_u64::<BigEndian>()?;

    Ok(WriteResult {
        count,
        committed,
        verifier,
    })
}

/// `READDIRPLUS(fh, cookie, cookieverf, dircount=0, maxcount)`.
pub(crate) fn readdirplus(
    call: &mut Nfs3Call<'_>,
    fh: &FileHandle,
    cookie: u64,
    cookieverf: u64,
    maxcount: u32,
) -> Result<ReadDirPlusResult, Error> {
    let mut payload = Vec::new();
    fh.serialise_into(&mut payload)?;
    payload.write_u64::<BigEndian>(cookie)?;
    payload.write_u64::<BigEndian>(cookieverf)?;
    payload.write_u32::<BigEndian>(0)?;
    payload.write_u32::<BigEndian>(maxcount)?;

    let reply = call.invoke(PROC_READDIRPLUS, &payload)?;
    let mut c = Cursor::new(reply.as_slice());
    check_status(&mut c)?;

    // dir_attributes (post-op), not needed.
    Fattr3::from_optional_cursor(&mut c)?;
    let returned_cookieverf = c.read_u64::<BigEndian>()?;

    let mut entries = Vec::new();
    let mut last_cookie = cookie;
    loop {
        if c.read_u32::<BigEndian>()? == 0 {
            break;
        }

        let file_id = c.read_u64::<BigEndian>()?;
        let name = read_name(&mut c, MAX_FILENAME_LENGTH)?;
        last_cookie = c.read_u64::<BigEndian>()?;
        let attrs = Fattr3::from_optional_cursor(&mut c)?;
        let handle = if c.read_u32::<BigEndian>()? != 0 {
            Some(FileHandle::from_cursor(&mut c)?)
        } else {
            None
        };

        entries.push(DirPlusEntry {
            name,
            file_id,
            handle,
            attrs,
        });
    }

    let eof = c.read_u32::<BigEndian>()? != 0;

    Ok(ReadDirPlusResult {
        entries,
        cookie: last_cookie,
        cookieverf: returned_cookieverf,
        eof,
    })
}

fn skip_wcc_data(c: &mut Cursor<&[u8]>) -> Result<(), Error> {
    // pre_op_attr: a small fixed-size struct guarded by a boolean.
    if c.read_u32::<BigEndian>()? != 0 {
        c.read_u64::<BigEndian>()?; // size
        c.read_u32::<BigEndian>()?; // mtime.seconds
        c.read_u32::<BigEndian>()?; // mtime.nseconds
        c.read_u32::<BigEndian>()?; // ctime.seconds
        c.read_u32::<BigEndian>()?; // ctime.nseconds
    }
    // post_op_attr: the full fattr3.
    Fattr3::from_optional_cursor(c)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_how_values() {
        assert_eq!(StableHow::Unstable as u32, 0);
        assert_eq!(StableHow::DataSync as u32, 1);
        assert_eq!(StableHow::FileSync as u32, 2);
    }

    #[test]
    fn test_create_mode_values() {
        assert_eq!(CreateMode::Unchecked as u32, 0);
        assert_eq!(CreateMode::Guarded as u32, 1);
    }
}
