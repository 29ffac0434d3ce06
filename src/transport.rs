//! The UDP transceiver (component C): owns one datagram socket per mount,
//! matches replies to calls by transaction id, and implements the
//! bounded-retry polling loop described for this crate's RPC layer.

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use byteorder::{BigEndian, ByteOrder};

use crate::Error;

const POLL_WINDOW: Duration = Duration::from_millis(500);
const POLL_INTERVAL: Duration = Duration::from_micros(500);

/// A non-blocking UDP socket bound to a fixed local port, used to exchange
/// ONC-RPC datagrams with exactly one remote peer at a time.
#[derive(Debug)]
pub(crate) struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Binds a new socket on `local_port` across all interfaces.
    pub(crate) fn bind(local_port: u16) -> Result<Self, Error> {
        let socket = UdpSocket::bind(("0.0.0.0", local_port))?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket })
    }

    /// Connects the socket to `addr`, so subsequent `send`/`recv` calls talk
    /// to that peer only.
    pub(crate) fn connect(&self, addr: SocketAddr) -> Result<(), Error> {
        self.socket.connect(addr)?;
        Ok(())
    }

    /// Returns the local address the OS assigned this socket, useful for
    /// deriving the `machinename` presented in an `AUTH_SYS` credential.
    pub(crate) fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.socket.local_addr()?)
    }

    /// Sends `buf[..request_len]` and polls for a reply whose leading xid
    /// matches `expected_xid`, retrying up to `retries` times.
    ///
    /// Datagrams with a mismatched xid are dropped and polling continues,
    /// protecting against a straggling reply to a call that was already
    /// retransmitted. Returns the number of bytes of the matching reply
    /// written into `buf`.
    pub(crate) fn send_recv(
        &self,
        buf: &mut [u8],
        request_len: usize,
        expected_xid: u32,
        retries: u32,
    ) -> Result<usize, Error> {
        for attempt in 0..=retries {
            self.socket.send(&buf[..request_len])?;
            tracing::debug!(xid = expected_xid, attempt, "sent rpc call");

            let deadline = Instant::now() + POLL_WINDOW;
            while Instant::now() < deadline {
                match self.socket.recv(buf) {
                    Ok(n) if n >= 4 => {
                        let xid = BigEndian::read_u32(&buf[..4]);
                        if xid == expected_xid {
                            return Ok(n);
                        }
                        tracing::trace!(xid, expected_xid, "dropping reply with mismatched xid");
                    }
                    Ok(_) => {
                        // Datagram too short to carry a xid; ignore it.
                    }
                    Err(e) if e.kind() == ErrorKind::WouldBlock => {}
                    // A connected UDP socket surfaces an ICMP port-unreachable
                    // as ECONNREFUSED on the next syscall; treat it the same
                    // as "no reply yet" so a slow-to-listen peer still gets
                    // the full retry budget instead of an immediate error.
                    Err(e) if e.kind() == ErrorKind::ConnectionRefused => {}
                    Err(e) => return Err(e.into()),
                }

                std::thread::sleep(POLL_INTERVAL);
            }
        }

        tracing::warn!(xid = expected_xid, retries, "rpc call timed out");
        Err(Error::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_recv_round_trip() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let server_addr = server.local_addr().unwrap();

        let client = UdpTransport::bind(0).unwrap();
        client.connect(server_addr).unwrap();

        let request = [0u8, 0, 0, 42, 1, 2, 3, 4];
        let mut buf = [0u8; 64];
        buf[..request.len()].copy_from_slice(&request);

        let echoer = std::thread::spawn(move || {
            let mut recv_buf = [0u8; 64];
            let (n, from) = server.recv_from(&mut recv_buf).unwrap();
            server.send_to(&recv_buf[..n], from).unwrap();
        });

        let n = client.send_recv(&mut buf, request.len(), 42, 0).unwrap();
        assert_eq!(&buf[..n], request.as_ref());

        echoer.join().unwrap();
    }

    #[test]
    fn test_timeout_when_no_reply() {
        let client = UdpTransport::bind(0).unwrap();
        // Loop back to ourselves; nothing will ever reply.
        let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        client.connect(addr).unwrap();

        let mut buf = [0u8; 16];
        buf[..4].copy_from_slice(&7u32.to_be_bytes());

        // This test intentionally waits out a full poll window; keep retries
        // at 0 to bound runtime.
        let err = client.send_recv(&mut buf, 4, 7, 0).unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }
}
