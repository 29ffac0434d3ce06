//! The mount registry (component J): maps short device names to mount
//! state and serializes access to each mount behind its own lock.

use std::collections::HashMap;
use std::io::SeekFrom;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::{self, AuthFlavor};
use crate::nfs3::{self, CreateMode, FsInfo, Nfs3Call, StableHow};
use crate::mount::MountClient;
use crate::path::{self, Cwd};
use crate::portmap::PortmapClient;
use crate::rpc::{PROGRAM_MOUNT, PROGRAM_NFS, VERSION_MOUNT, VERSION_NFS};
use crate::transport::UdpTransport;
use crate::{
    ClientConfig, DirEntry, DirSession, Error, Fattr3, FileHandle, FileSession, Sattr3, SetTime,
};

const NFS3ERR_NOENT: u32 = 2;
const NFS3ERR_EXIST: u32 = 17;
const MAX_DEVICE_NAME_LEN: usize = 8;

/// Flags controlling [`MountRegistry::open`], mirroring the POSIX `open(2)`
/// flags the device adapter surface is built around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    /// Create the file if it does not exist.
    pub create: bool,
    /// Combined with `create`, fail if the file already exists.
    pub exclusive: bool,
    /// Truncate an existing file to zero length.
    pub truncate: bool,
    /// Position the cursor at the end of the file after opening.
    pub append: bool,
    /// Open for reading.
    pub read: bool,
    /// Open for writing.
    pub write: bool,
}

struct MountState {
    transport: UdpTransport,
    connected_port: Option<u16>,
    remote_ip: Ipv4Addr,
    mount_port: u16,
    nfs_port: u16,
    scratch: Vec<u8>,
    xid: u32,
    root_fh: FileHandle,
    cwd_fh: Option<FileHandle>,
    cwd_path: Option<String>,
    uid: u32,
    gid: u32,
    readonly: bool,
    fsinfo: FsInfo,
    retries: u32,
    machine_name: String,
}

impl MountState {
    fn next_xid(&mut self) -> u32 {
        self.xid += 1;
        self.xid
    }

    fn connect_for(&mut self, port: u16) -> Result<(), Error> {
        if self.connected_port == Some(port) {
            return Ok(());
        }
        self.transport
            .connect(SocketAddr::from((self.remote_ip, port)))?;
        self.connected_port = Some(port);
        Ok(())
    }

    /// Builds an `Nfs3Call` borrowing this state's transport and scratch
    /// buffer directly by field, so it does not conflict with a
    /// previously-cloned `cwd_snapshot`.
    fn nfs_call(&mut self) -> Result<Nfs3Call<'_>, Error> {
        self.connect_for(self.nfs_port)?;
        self.xid += 1;
        let xid = self.xid;
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let auth = auth::unix_credential(stamp, self.machine_name.as_bytes(), self.uid, self.gid);
        Ok(Nfs3Call {
            transport: &self.transport,
            scratch: &mut self.scratch,
            xid,
            retries: self.retries,
            auth,
        })
    }

    /// Clones the cached current directory, if any, into owned values so a
    /// [`Cwd`] can be built without holding a borrow of `self` across a
    /// later `nfs_call`.
    fn cwd_snapshot(&self) -> Option<(FileHandle, String)> {
        match (&self.cwd_fh, &self.cwd_path) {
            (Some(fh), Some(path)) => Some((fh.clone(), path.clone())),
            _ => None,
        }
    }
}

fn cwd_ref(snapshot: &Option<(FileHandle, String)>) -> Option<Cwd<'_>> {
    snapshot
        .as_ref()
        .map(|(fh, path)| Cwd { fh, path: path.as_str() })
}

/// Maps short device names to mounted `NFSv3` exports, and serializes every
/// operation against a mount behind that mount's own lock.
#[derive(Debug)]
pub struct MountRegistry {
    config: ClientConfig,
    next_client_port: u16,
    mounts: HashMap<String, Mutex<MountState>>,
}

impl std::fmt::Debug for MountState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountState")
            .field("remote_ip", &self.remote_ip)
            .field("readonly", &self.readonly)
            .finish()
    }
}

impl MountRegistry {
    /// Constructs an empty registry using the given configuration.
    pub fn new(config: ClientConfig) -> Self {
        let next_client_port = config.client_port_base;
        Self {
            config,
            next_client_port,
            mounts: HashMap::new(),
        }
    }

    /// Mounts `export_path` on `server_ip` under the short device name
    /// `name`. Mounting an already-registered name is a no-op success.
    pub fn mount(
        &mut self,
        name: &str,
        server_ip: Ipv4Addr,
        export_path: &str,
        uid: u32,
        gid: u32,
        readonly: bool,
    ) -> Result<(), Error> {
        if name.len() > MAX_DEVICE_NAME_LEN {
            return Err(Error::InvalidPath(name.to_string()));
        }
        if self.mounts.contains_key(name) {
            return Ok(());
        }

        let port = self.next_client_port;
        self.next_client_port = self.next_client_port.wrapping_add(1);

        match self.try_mount(server_ip, export_path, uid, gid, readonly, port) {
            Ok(state) => {
                tracing::debug!(name, %server_ip, export_path, "mount succeeded");
                self.mounts.insert(name.to_string(), Mutex::new(state));
                Ok(())
            }
            Err(e) => {
                self.next_client_port = self.next_client_port.wrapping_sub(1);
                Err(e)
            }
        }
    }

    fn try_mount(
        &self,
        server_ip: Ipv4Addr,
        export_path: &str,
        uid: u32,
        gid: u32,
        readonly: bool,
        local_port: u16,
    ) -> Result<MountState, Error> {
        let transport = UdpTransport::bind(local_port)?;
        let mut xid = 0u32;
        let retries = self.config.udp_retries;

        let portmap_addr = SocketAddr::from((server_ip, self.config.portmapper_port));
        transport.connect(portmap_addr)?;

        let machine_name = match transport.local_addr()? {
            SocketAddr::V4(a) => a.ip().to_string(),
            SocketAddr::V6(a) => a.ip().to_string(),
        };

        let mut scratch = vec![0u8; self.config.buffer_size];

        xid += 1;
        let mount_port = PortmapClient::get_port(
            &transport,
            &mut scratch,
            xid,
            retries,
            PROGRAM_MOUNT,
            VERSION_MOUNT,
        )?;

        transport.connect(SocketAddr::from((server_ip, mount_port)))?;
        xid += 1;
        let mount_point = MountClient::mount(
            &transport,
            &mut scratch,
            xid,
            retries,
            AuthFlavor::AuthNone(None),
            export_path,
        )?;

        transport.connect(portmap_addr)?;
        xid += 1;
        let nfs_port = PortmapClient::get_port(
            &transport,
            &mut scratch,
            xid,
            retries,
            PROGRAM_NFS,
            VERSION_NFS,
        )?;

        transport.connect(SocketAddr::from((server_ip, nfs_port)))?;

        let mut state = MountState {
            transport,
            connected_port: Some(nfs_port),
            remote_ip: server_ip,
            mount_port,
            nfs_port,
            scratch,
            xid,
            root_fh: mount_point.root,
            cwd_fh: None,
            cwd_path: None,
            uid,
            gid,
            readonly,
            fsinfo: FsInfo {
                rtmax: 0,
                rtpref: 0,
                rtmult: 1,
                wtmax: 0,
                wtpref: 0,
                wtmult: 1,
                dtpref: 0,
            },
            retries,
            machine_name,
        };

        let root = state.root_fh.clone();
        let fsinfo = {
            let mut call = state.nfs_call()?;
            nfs3::fsinfo(&mut call, &root)?
        };
        state.fsinfo = fsinfo;

        Ok(state)
    }

    /// Unmounts `name`, clearing all cached state. `UMNT` failures are
    /// logged but not surfaced: server-side cleanup of a missing unmount is
    /// the server's responsibility.
    pub fn unmount(&mut self, name: &str) -> Result<(), Error> {
        let state = match self.mounts.remove(name) {
            Some(s) => s,
            None => return Err(Error::NoDevice(name.to_string())),
        };

        let mut state = state.into_inner().unwrap_or_else(|e| e.into_inner());
        let mount_port = state.mount_port;
        state.connect_for(mount_port)?;
        let xid = state.next_xid();
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        let auth = auth::unix_credential(stamp, state.machine_name.as_bytes(), state.uid, state.gid);

        if let Err(e) = MountClient::unmount(
            &state.transport,
            &mut state.scratch,
            xid,
            state.retries,
            auth,
            "",
        ) {
            tracing::warn!(name, error = %e, "umnt failed, proceeding with local teardown");
        }

        Ok(())
    }

    fn with_mount<T>(
        &self,
        device: &str,
        f: impl FnOnce(&mut MountState) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mount = self
            .mounts
            .get(device)
            .ok_or_else(|| Error::NoDevice(device.to_string()))?;
        let mut state = mount.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// Opens `path` (`device:[/]segments…`), creating or truncating the
    /// target per `flags`.
    pub fn open(&self, path: &str, flags: OpenFlags, mode: u32) -> Result<FileSession, Error> {
        let (device, rest) = path::split_device(path)?;

        self.with_mount(device, |state| {
            if state.readonly && flags.write {
                return Err(Error::ReadOnlyFs);
            }

            let root = state.root_fh.clone();
            let cwd_snapshot = state.cwd_snapshot();
            let (dir_fh, basename) = {
                let mut call = state.nfs_call()?;
                path::dir_of(&mut call, &root, cwd_ref(&cwd_snapshot), rest)?
            };

            let looked_up = {
                let mut call = state.nfs_call()?;
                nfs3::lookup(&mut call, &dir_fh, &basename)
            };

            let (fh, size, is_new) = match looked_up {
                Ok((fh, attrs)) => {
                    if flags.create && flags.exclusive {
                        return Err(Error::Exists);
                    }

                    if flags.truncate {
                        let sattr = Sattr3 {
                            mode: Some(mode),
                            uid: Some(state.uid),
                            gid: Some(state.gid),
                            size: Some(0),
                            atime: SetTime::ServerTime,
                            mtime: SetTime::ServerTime,
                        };
                        let fh = {
                            let mut call = state.nfs_call()?;
                            nfs3::create(&mut call, &dir_fh, &basename, CreateMode::Unchecked, &sattr)?
                        };
                        (fh, 0, true)
                    } else {
                        let size = match attrs {
                            Some(a) => a.size,
                            None => {
                                let mut call = state.nfs_call()?;
                                nfs3::getattr(&mut call, &fh)?.size
                            }
                        };
                        (fh, size, false)
                    }
                }
                Err(Error::NfsError(NFS3ERR_NOENT)) => {
                    if !flags.create {
                        return Err(Error::NoEntry);
                    }
                    let create_mode = if flags.truncate {
                        CreateMode::Unchecked
                    } else {
                        CreateMode::Guarded
                    };
                    let sattr = Sattr3 {
                        mode: Some(mode),
                        uid: Some(state.uid),
                        gid: Some(state.gid),
                        size: Some(0),
                        atime: SetTime::ServerTime,
                        mtime: SetTime::ServerTime,
                    };
                    let created = {
                        let mut call = state.nfs_call()?;
                        nfs3::create(&mut call, &dir_fh, &basename, create_mode, &sattr)
                    };

                    match created {
                        Ok(fh) => (fh, 0, true),
                        Err(Error::NfsError(NFS3ERR_EXIST))
                            if create_mode == CreateMode::Guarded && !flags.exclusive =>
                        {
                            let mut call = state.nfs_call()?;
                            let (fh, attrs) = nfs3::lookup(&mut call, &dir_fh, &basename)?;
                            let size = match attrs {
                                Some(a) => a.size,
                                None => {
                                    let mut call = state.nfs_call()?;
                                    nfs3::getattr(&mut call, &fh)?.size
                                }
                            };
                            (fh, size, false)
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(e) => return Err(e),
            };

            let pos = if flags.append { size } else { 0 };

            Ok(FileSession {
                device: device.to_string(),
                fh,
                size,
                pos,
                read: flags.read,
                write: flags.write,
                append: flags.append,
                is_new,
                should_commit: false,
                write_verifier: None,
            })
        })
    }

    /// Closes `session`, issuing a `COMMIT` if any data was written since
    /// open.
    pub fn close(&self, session: FileSession) -> Result<(), Error> {
        if !session.should_commit {
            return Ok(());
        }

        self.with_mount(&session.device, |state| {
            let mut call = state.nfs_call()?;
            nfs3::commit(&mut call, &session.fh)
        })
    }

    /// Reads up to `buf.len()` bytes at the session's current position,
    /// chunked according to the mount's `FSINFO`-advertised block size.
    pub fn read(&self, session: &mut FileSession, buf: &mut [u8]) -> Result<usize, Error> {
        if !session.read {
            return Err(Error::BadFileDescriptor);
        }

        self.with_mount(&session.device, |state| {
            let block = read_block_size(&state.fsinfo, state.scratch.len());
            let mut read = 0usize;

            while read < buf.len() {
                let n = std::cmp::min(block as usize, buf.len() - read);
                let result = {
                    let mut call = state.nfs_call()?;
                    nfs3::read(&mut call, &session.fh, session.pos + read as u64, n as u32)?
                };

                let copy_len = result.data.len().min(n);
                buf[read..read + copy_len].copy_from_slice(&result.data[..copy_len]);
                read += copy_len;

                if result.eof {
                    break;
                }
                if copy_len == 0 {
                    break;
                }
            }

            session.pos += read as u64;
            Ok(read)
        })
    }

    /// Writes `buf` at the session's current position, chunked per the
    /// chunked-write algorithm, and tracks the server write verifier.
    pub fn write(&self, session: &mut FileSession, buf: &[u8]) -> Result<usize, Error> {
        if !session.write {
            return Err(Error::BadFileDescriptor);
        }

        self.with_mount(&session.device, |state| {
            if state.readonly {
                return Err(Error::ReadOnlyFs);
            }

            if session.append {
                session.pos = session.size;
            }

            let block = write_block_size(&state.fsinfo, state.scratch.len());
            let mut written = 0usize;

            while written < buf.len() {
                let n = std::cmp::min(block as usize, buf.len() - written);
                let result = {
                    let mut call = state.nfs_call()?;
                    nfs3::write(
                        &mut call,
                        &session.fh,
                        session.pos + written as u64,
                        &buf[written..written + n],
                    )?
                };

                // Data reached the server, so a COMMIT is owed at close even
                // if this write ultimately fails below: a verifier mismatch
                // means prior unstable writes may already be lost, not that
                // this one was a no-op.
                session.should_commit = true;

                match session.write_verifier {
                    None => session.write_verifier = Some(result.verifier),
                    Some(v) if v != result.verifier => {
                        session.pos += written as u64;
                        session.size = session.size.max(session.pos);
                        return Err(Error::WriteVerifierChanged);
                    }
                    Some(_) => {}
                }

                written += result.count as usize;

                if result.committed != StableHow::Unstable {
                    break;
                }
                if result.count == 0 {
                    break;
                }
            }

            session.pos += written as u64;
            session.size = session.size.max(session.pos);

            Ok(written)
        })
    }

    /// Repositions the session's cursor.
    pub fn seek(&self, session: &mut FileSession, pos: SeekFrom) -> Result<u64, Error> {
        let new_pos = match pos {
            SeekFrom::Start(p) => p as i64,
            SeekFrom::Current(p) => session.pos as i64 + p,
            SeekFrom::End(p) => {
                if session.is_new {
                    return Err(Error::Invalid);
                }
                session.size as i64 + p
            }
        };

        if new_pos < 0 {
            return Err(Error::Invalid);
        }

        session.pos = new_pos as u64;
        Ok(session.pos)
    }

    /// Returns the attributes of the object at `path`.
    pub fn stat(&self, path: &str) -> Result<Fattr3, Error> {
        let (device, rest) = path::split_device(path)?;
        self.with_mount(device, |state| {
            let root = state.root_fh.clone();
            let cwd_snapshot = state.cwd_snapshot();
            let fh = {
                let mut call = state.nfs_call()?;
                path::resolve(&mut call, &root, cwd_ref(&cwd_snapshot), rest, false)?
            };
            let mut call = state.nfs_call()?;
            nfs3::getattr(&mut call, &fh)
        })
    }

    /// Removes the file at `path`.
    pub fn unlink(&self, path: &str) -> Result<(), Error> {
        let (device, rest) = path::split_device(path)?;
        self.with_mount(device, |state| {
            if state.readonly {
                return Err(Error::ReadOnlyFs);
            }
            let root = state.root_fh.clone();
            let cwd_snapshot = state.cwd_snapshot();
            let (dir_fh, name) = {
                let mut call = state.nfs_call()?;
                path::dir_of(&mut call, &root, cwd_ref(&cwd_snapshot), rest)?
            };
            let mut call = state.nfs_call()?;
            nfs3::remove(&mut call, &dir_fh, &name)
        })
    }

    /// Removes the empty directory at `path`.
    pub fn rmdir(&self, path: &str) -> Result<(), Error> {
        let (device, rest) = path::split_device(path)?;
        self.with_mount(device, |state| {
            if state.readonly {
                return Err(Error::ReadOnlyFs);
            }
            let root = state.root_fh.clone();
            let cwd_snapshot = state.cwd_snapshot();
            let (dir_fh, name) = {
                let mut call = state.nfs_call()?;
                path::dir_of(&mut call, &root, cwd_ref(&cwd_snapshot), rest)?
            };
            let mut call = state.nfs_call()?;
            nfs3::rmdir(&mut call, &dir_fh, &name)
        })
    }

    /// Renames `old` to `new`; both paths must be on the same device.
    pub fn rename(&self, old: &str, new: &str) -> Result<(), Error> {
        let (old_device, old_rest) = path::split_device(old)?;
        let (new_device, new_rest) = path::split_device(new)?;
        if old_device != new_device {
            return Err(Error::InvalidPath(new.to_string()));
        }

        self.with_mount(old_device, |state| {
            if state.readonly {
                return Err(Error::ReadOnlyFs);
            }
            let root = state.root_fh.clone();
            let cwd_snapshot = state.cwd_snapshot();
            let (from_dir, from_name) = {
                let mut call = state.nfs_call()?;
                path::dir_of(&mut call, &root, cwd_ref(&cwd_snapshot), old_rest)?
            };
            let (to_dir, to_name) = {
                let mut call = state.nfs_call()?;
                path::dir_of(&mut call, &root, cwd_ref(&cwd_snapshot), new_rest)?
            };
            let mut call = state.nfs_call()?;
            nfs3::rename(&mut call, &from_dir, &from_name, &to_dir, &to_name)
        })
    }

    /// Changes the mount's cached current directory.
    pub fn chdir(&self, path: &str) -> Result<(), Error> {
        let (device, rest) = path::split_device(path)?;
        self.with_mount(device, |state| {
            let root = state.root_fh.clone();
            let cwd_snapshot = state.cwd_snapshot();
            let fh = {
                let mut call = state.nfs_call()?;
                path::resolve(&mut call, &root, cwd_ref(&cwd_snapshot), rest, true)?
            };
            state.cwd_fh = Some(fh);
            state.cwd_path = Some(rest.to_string());
            Ok(())
        })
    }

    /// Creates a directory at `path`.
    pub fn mkdir(&self, path: &str, mode: u32) -> Result<(), Error> {
        let (device, rest) = path::split_device(path)?;
        self.with_mount(device, |state| {
            if state.readonly {
                return Err(Error::ReadOnlyFs);
            }
            let root = state.root_fh.clone();
            let cwd_snapshot = state.cwd_snapshot();
            let (dir_fh, name) = {
                let mut call = state.nfs_call()?;
                path::dir_of(&mut call, &root, cwd_ref(&cwd_snapshot), rest)?
            };
            let sattr = Sattr3 {
                mode: Some(mode),
                uid: Some(state.uid),
                gid: Some(state.gid),
                size: None,
                atime: SetTime::ServerTime,
                mtime: SetTime::ServerTime,
            };
            let mut call = state.nfs_call()?;
            nfs3::mkdir(&mut call, &dir_fh, &name, &sattr).map(|_| ())
        })
    }

    /// Opens a directory at `path` for `readdir_next` iteration.
    pub fn opendir(&self, path: &str) -> Result<DirSession, Error> {
        let (device, rest) = path::split_device(path)?;
        self.with_mount(device, |state| {
            let root = state.root_fh.clone();
            let cwd_snapshot = state.cwd_snapshot();
            let fh = {
                let mut call = state.nfs_call()?;
                path::resolve(&mut call, &root, cwd_ref(&cwd_snapshot), rest, true)?
            };

            Ok(DirSession {
                device: device.to_string(),
                fh,
                cookie: 0,
                cookieverf: 0,
                eof: false,
                children: Vec::new(),
                cursor: 0,
            })
        })
    }

    /// Returns the next directory entry, fetching another `READDIRPLUS`
    /// page if the materialized child list is exhausted and the server has
    /// not yet signalled `eof`.
    pub fn readdir_next(&self, dir: &mut DirSession) -> Result<DirEntry, Error> {
        self.with_mount(&dir.device, |state| {
            if dir.cursor >= dir.children.len() {
                if dir.eof {
                    return Err(Error::NoEntry);
                }

                let maxcount = state.fsinfo.dtpref.max(state.scratch.len() as u32 / 2);
                let page = {
                    let mut call = state.nfs_call()?;
                    nfs3::readdirplus(&mut call, &dir.fh, dir.cookie, dir.cookieverf, maxcount)?
                };

                dir.cookie = page.cookie;
                dir.cookieverf = page.cookieverf;
                dir.eof = page.eof;

                for entry in page.entries {
                    let Some(ref h) = entry.handle else {
                        continue;
                    };
                    if h == &dir.fh {
                        continue;
                    }
                    if entry.name.len() > crate::xdr::MAX_FILENAME_LENGTH {
                        continue;
                    }
                    dir.children.push(DirEntry {
                        name: entry.name,
                        file_id: entry.file_id,
                        attrs: entry.attrs,
                    });
                }

                if dir.cursor >= dir.children.len() {
                    return Err(Error::NoEntry);
                }
            }

            let entry = dir.children[dir.cursor].clone();
            dir.cursor += 1;
            Ok(entry)
        })
    }

    /// Resets `dir`'s iteration cursor without re-fetching entries.
    pub fn dirreset(&self, dir: &mut DirSession) {
        dir.dirreset();
    }

    /// Closes `dir`, releasing its cached state.
    pub fn closedir(&self, _dir: DirSession) {}
}

fn read_block_size(fsinfo: &FsInfo, buffer_size: usize) -> u32 {
    let headroom = 512usize;
    let cap = (buffer_size.saturating_sub(headroom) as u32 / fsinfo.rtmult.max(1)) * fsinfo.rtmult.max(1);
    fsinfo.rtpref.min(cap.max(fsinfo.rtmult.max(1))).max(1)
}

fn write_block_size(fsinfo: &FsInfo, buffer_size: usize) -> u32 {
    let headroom = 512usize;
    let cap = (buffer_size.saturating_sub(headroom) as u32 / fsinfo.wtmult.max(1)) * fsinfo.wtmult.max(1);
    fsinfo.wtpref.min(cap.max(fsinfo.wtmult.max(1))).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_size_bounds() {
        let fsinfo = FsInfo {
            rtmax: 65536,
            rtpref: 32768,
            rtmult: 4096,
            wtmax: 65536,
            wtpref: 32768,
            wtmult: 4096,
            dtpref: 8192,
        };

        assert!(read_block_size(&fsinfo, 8192) <= fsinfo.rtpref);
        assert!(write_block_size(&fsinfo, 8192) <= fsinfo.wtpref);
    }

    #[test]
    fn test_mount_name_too_long_rejected() {
        let mut reg = MountRegistry::new(ClientConfig::default());
        let err = reg
            .mount("toolongname", Ipv4Addr::LOCALHOST, "/export", 0, 0, false)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn test_unmount_unknown_device() {
        let mut reg = MountRegistry::new(ClientConfig::default());
        let err = reg.unmount("nope").unwrap_err();
        assert!(matches!(err, Error::NoDevice(_)));
    }
}
