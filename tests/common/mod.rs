//! Support code for the end-to-end tests: a scripted UDP responder that
//! plays the part of the portmapper, mount daemon and NFS server, built
//! entirely out of this crate's own public wire types so a scenario test
//! constructs exactly the bytes a real server would send.

use std::io::Cursor;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use nfs3_client::auth::AuthFlavor;
use nfs3_client::{AcceptedReply, AcceptedStatus, MessageType, ReplyBody, RpcMessage};

/// A single decoded call delivered to a [`FakeServer`] handler.
pub struct Call {
    pub xid: u32,
    pub procedure: u32,
    pub payload: Vec<u8>,
}

/// A scripted UDP peer, run on its own thread for the lifetime of the test.
///
/// The handler closure is invoked once per datagram received, and returns
/// the list of `(xid, payload)` accepted-success replies to send back, in
/// order. An empty list drops the datagram (simulating packet loss); most
/// handlers return a single `(call.xid, payload)` pair, but a handler can
/// also prepend a reply carrying a mismatched xid to simulate a stale
/// straggler arriving ahead of the real answer.
pub struct FakeServer {
    port: u16,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl FakeServer {
    pub fn spawn(mut handler: impl FnMut(Call) -> Vec<(u32, Vec<u8>)> + Send + 'static) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("bind fake server socket");
        socket
            .set_read_timeout(Some(Duration::from_millis(50)))
            .expect("set read timeout");
        let port = socket.local_addr().expect("local addr").port();

        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            let mut buf = [0u8; 16384];
            while !stop_thread.load(Ordering::Relaxed) {
                let (n, from) = match socket.recv_from(&mut buf) {
                    Ok(v) => v,
                    Err(_) => continue,
                };

                let msg = match RpcMessage::from_datagram(&buf[..n]) {
                    Ok(m) => m,
                    Err(_) => continue,
                };
                let xid = msg.xid();
                let call_body = match msg.call_body() {
                    Some(c) => c,
                    None => continue,
                };

                let call = Call {
                    xid,
                    procedure: call_body.procedure(),
                    payload: call_body.payload().to_vec(),
                };

                for (reply_xid, payload) in handler(call) {
                    let reply = RpcMessage::new(
                        reply_xid,
                        MessageType::Reply(ReplyBody::Accepted(AcceptedReply::new(
                            AuthFlavor::AuthNone(None),
                            AcceptedStatus::Success(&payload),
                        ))),
                    );
                    let bytes = reply.serialise().expect("serialise fake reply");
                    let _ = socket.send_to(&bytes, from);
                }
            }
        });

        Self {
            port,
            stop,
            handle: Some(handle),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for FakeServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Spawns a portmapper that answers `GETPORT` for the MOUNT and NFS
/// programs with the given fixed ports.
pub fn spawn_portmap(mount_port: u16, nfs_port: u16) -> FakeServer {
    FakeServer::spawn(move |call| {
        assert_eq!(call.procedure, 3, "only GETPORT is exercised here");
        let mut c = Cursor::new(call.payload.as_slice());
        let program = c.read_u32::<BigEndian>().unwrap();
        let _version = c.read_u32::<BigEndian>().unwrap();

        let port = match program {
            100_005 => mount_port,
            100_003 => nfs_port,
            _ => 0,
        };

        let mut reply = Vec::new();
        reply.write_u32::<BigEndian>(u32::from(port)).unwrap();
        vec![(call.xid, reply)]
    })
}

/// Spawns a mount daemon that accepts any `MNT` with `root_fh` and answers
/// `UMNT` unconditionally.
pub fn spawn_mountd(root_fh: &'static [u8]) -> FakeServer {
    FakeServer::spawn(move |call| match call.procedure {
        1 => {
            // MNT: mountstat3(0) + fhandle3 + auth_flavors<>
            let mut reply = Vec::new();
            reply.write_u32::<BigEndian>(0).unwrap();
            write_opaque(&mut reply, root_fh);
            reply.write_u32::<BigEndian>(1).unwrap(); // one supported flavor
            reply.write_u32::<BigEndian>(1).unwrap(); // AUTH_UNIX
            vec![(call.xid, reply)]
        }
        3 => vec![(call.xid, Vec::new())], // UMNT: void
        other => panic!("unexpected mountd procedure {other}"),
    })
}

/// Writes a `string<N>`/variable opaque value: a length prefix, the bytes,
/// and zero padding to the next 4-byte boundary (RFC 1014 section 3.9).
pub fn write_opaque(buf: &mut Vec<u8>, data: &[u8]) {
    buf.write_u32::<BigEndian>(data.len() as u32).unwrap();
    buf.extend_from_slice(data);
    let pad = (4 - data.len() % 4) % 4;
    buf.extend(std::iter::repeat_n(0u8, pad));
}

/// Reads a `string<N>`/variable opaque value written by [`write_opaque`].
pub fn read_opaque(c: &mut Cursor<&[u8]>) -> Vec<u8> {
    let len = c.read_u32::<BigEndian>().unwrap() as usize;
    let mut data = vec![0u8; len];
    std::io::Read::read_exact(c, &mut data).unwrap();
    let pad = (4 - len % 4) % 4;
    c.set_position(c.position() + pad as u64);
    data
}

pub fn read_name(c: &mut Cursor<&[u8]>) -> String {
    String::from_utf8(read_opaque(c)).unwrap()
}

/// Reads a `fhandle3` written by [`write_opaque`] (filehandles share the
/// generic opaque wire shape).
pub fn read_fh(c: &mut Cursor<&[u8]>) -> Vec<u8> {
    read_opaque(c)
}

/// Writes a minimal, all-zero `fattr3` of the given type/size, sufficient
/// for the fields this client actually reads off a reply.
pub fn write_fattr3(buf: &mut Vec<u8>, file_type: u32, size: u64, fileid: u64) {
    buf.write_u32::<BigEndian>(file_type).unwrap(); // ftype3
    buf.write_u32::<BigEndian>(0o644).unwrap(); // mode
    buf.write_u32::<BigEndian>(1).unwrap(); // nlink
    buf.write_u32::<BigEndian>(0).unwrap(); // uid
    buf.write_u32::<BigEndian>(0).unwrap(); // gid
    buf.write_u64::<BigEndian>(size).unwrap(); // size
    buf.write_u64::<BigEndian>(size).unwrap(); // used
    buf.write_u32::<BigEndian>(0).unwrap(); // rdev specdata1
    buf.write_u32::<BigEndian>(0).unwrap(); // rdev specdata2
    buf.write_u64::<BigEndian>(0).unwrap(); // fsid
    buf.write_u64::<BigEndian>(fileid).unwrap(); // fileid
    for _ in 0..3 {
        // atime, mtime, ctime
        buf.write_u32::<BigEndian>(0).unwrap();
        buf.write_u32::<BigEndian>(0).unwrap();
    }
}

/// Writes a `post_op_attr`/`pre_op_attr` with no attributes present.
pub fn write_attr_absent(buf: &mut Vec<u8>) {
    buf.write_u32::<BigEndian>(0).unwrap();
}

/// Writes a `post_op_attr` carrying the given file attributes.
pub fn write_attr_present(buf: &mut Vec<u8>, file_type: u32, size: u64, fileid: u64) {
    buf.write_u32::<BigEndian>(1).unwrap();
    write_fattr3(buf, file_type, size, fileid);
}

/// Builds an `FSINFO` success reply with the given block-size hints.
pub fn fsinfo_reply(rtpref: u32, wtpref: u32, dtpref: u32) -> Vec<u8> {
    let mut reply = Vec::new();
    reply.write_u32::<BigEndian>(0).unwrap(); // nfsstat3 OK
    write_attr_absent(&mut reply); // obj_attributes
    reply.write_u32::<BigEndian>(rtpref.max(4096)).unwrap(); // rtmax
    reply.write_u32::<BigEndian>(rtpref).unwrap(); // rtpref
    reply.write_u32::<BigEndian>(4).unwrap(); // rtmult
    reply.write_u32::<BigEndian>(wtpref.max(4096)).unwrap(); // wtmax
    reply.write_u32::<BigEndian>(wtpref).unwrap(); // wtpref
    reply.write_u32::<BigEndian>(4).unwrap(); // wtmult
    reply.write_u32::<BigEndian>(dtpref).unwrap(); // dtpref
    reply
}

/// Builds a `LOOKUP` success reply: a filehandle and present object/dir
/// attributes.
pub fn lookup_reply(fh: &[u8], file_type: u32, size: u64, fileid: u64) -> Vec<u8> {
    let mut reply = Vec::new();
    reply.write_u32::<BigEndian>(0).unwrap();
    write_opaque(&mut reply, fh);
    write_attr_present(&mut reply, file_type, size, fileid);
    write_attr_absent(&mut reply); // dir_attributes
    reply
}

/// Builds a `LOOKUP` failure reply carrying the given `nfsstat3` error and
/// post-op dir attributes absent.
pub fn lookup_err_reply(status: u32) -> Vec<u8> {
    let mut reply = Vec::new();
    reply.write_u32::<BigEndian>(status).unwrap();
    write_attr_absent(&mut reply); // dir_attributes
    reply
}

/// Builds a `CREATE` success reply: a present filehandle and absent
/// pre/post write cc data.
pub fn create_reply(fh: &[u8]) -> Vec<u8> {
    let mut reply = Vec::new();
    reply.write_u32::<BigEndian>(0).unwrap();
    reply.write_u32::<BigEndian>(1).unwrap(); // handle present
    write_opaque(&mut reply, fh);
    write_attr_absent(&mut reply); // obj_attributes
    write_attr_absent(&mut reply); // pre_op (wcc, before)
    write_attr_absent(&mut reply); // post_op (wcc, after)
    reply
}

/// Builds a `CREATE` failure reply carrying the given `nfsstat3` error and
/// absent pre/post write cc data.
pub fn create_err_reply(status: u32) -> Vec<u8> {
    let mut reply = Vec::new();
    reply.write_u32::<BigEndian>(status).unwrap();
    write_attr_absent(&mut reply); // pre_op (wcc, before)
    write_attr_absent(&mut reply); // post_op (wcc, after)
    reply
}

/// Builds a `READ` success reply carrying `data` and the given `eof` flag.
pub fn read_reply(data: &[u8], eof: bool) -> Vec<u8> {
    let mut reply = Vec::new();
    reply.write_u32::<BigEndian>(0).unwrap();
    write_attr_absent(&mut reply); // file post_op_attr
    reply.write_u32::<BigEndian>(data.len() as u32).unwrap();
    reply.write_u32::<BigEndian>(u32::from(eof)).unwrap();
    write_opaque(&mut reply, data);
    reply
}

/// Builds a `WRITE` success reply for `count` bytes committed `stable_how`
/// with the given write verifier.
pub fn write_reply(count: u32, stable_how: u32, verifier: u64) -> Vec<u8> {
    let mut reply = Vec::new();
    reply.write_u32::<BigEndian>(0).unwrap();
    write_attr_absent(&mut reply); // wcc: pre_op_attr
    write_attr_absent(&mut reply); // wcc: post_op_attr
    reply.write_u32::<BigEndian>(count).unwrap();
    reply.write_u32::<BigEndian>(stable_how).unwrap();
    reply.write_u64::<BigEndian>(verifier).unwrap();
    reply
}

/// Builds a `COMMIT` success reply with the given verifier.
pub fn commit_reply(verifier: u64) -> Vec<u8> {
    let mut reply = Vec::new();
    reply.write_u32::<BigEndian>(0).unwrap();
    write_attr_absent(&mut reply); // wcc: pre_op_attr
    write_attr_absent(&mut reply); // wcc: post_op_attr
    reply.write_u64::<BigEndian>(verifier).unwrap();
    reply
}

/// One child entry for a scripted `READDIRPLUS` page.
pub struct DirPlusEntry<'a> {
    pub file_id: u64,
    pub name: &'a str,
    pub handle: &'a [u8],
}

/// Builds a `READDIRPLUS` success reply containing `entries`, the given
/// `cookieverf`, and trailing `eof` marker.
pub fn readdirplus_reply(cookieverf: u64, entries: &[DirPlusEntry<'_>], eof: bool) -> Vec<u8> {
    let mut reply = Vec::new();
    reply.write_u32::<BigEndian>(0).unwrap();
    write_attr_absent(&mut reply); // dir_attributes
    reply.write_u64::<BigEndian>(cookieverf).unwrap();

    for (i, entry) in entries.iter().enumerate() {
        reply.write_u32::<BigEndian>(1).unwrap(); // entry present
        reply.write_u64::<BigEndian>(entry.file_id).unwrap();
        write_opaque(&mut reply, entry.name.as_bytes());
        reply.write_u64::<BigEndian>(i as u64 + 1).unwrap(); // cookie
        write_attr_absent(&mut reply); // name_attributes
        reply.write_u32::<BigEndian>(1).unwrap(); // name_handle present
        write_opaque(&mut reply, entry.handle);
    }
    reply.write_u32::<BigEndian>(0).unwrap(); // no more entries
    reply.write_u32::<BigEndian>(u32::from(eof)).unwrap();
    reply
}
