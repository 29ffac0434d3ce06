//! A synchronous ONC-RPC v2 client implementing the MOUNT and NFS version 3
//! protocols over UDP.
//!
//! This crate speaks just enough of [RFC 5531] (ONC-RPC), [RFC 1813]
//! (NFSv3) and the MOUNT protocol to let a caller mount an export from a
//! remote NFSv3 server and perform file and directory operations against it,
//! without requiring a kernel-level NFS client.
//!
//! [RFC 5531]: https://tools.ietf.org/html/rfc5531
//! [RFC 1813]: https://tools.ietf.org/html/rfc1813
#![deny(rustdoc::broken_intra_doc_links, rust_2018_idioms)]
#![warn(
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::explicit_iter_loop,
    clippy::future_not_send,
    clippy::todo,
    clippy::unimplemented,
    clippy::use_self,
    clippy::doc_markdown,
    clippy::print_stdout,
    missing_debug_implementations,
    unused_crate_dependencies,
    unreachable_pub,
    missing_docs
)]

mod errors;
pub use errors::Error;

mod opaque;
pub(crate) use opaque::*;

mod rpc_message;
pub use rpc_message::*;

mod call_body;
pub use call_body::*;

mod reply;
pub use reply::*;

pub mod auth;

mod xdr;
pub use xdr::*;

mod config;
pub use config::ClientConfig;

mod transport;

mod rpc;

mod portmap;

mod mount;
pub use mount::MountPoint;

mod nfs3;
pub use nfs3::*;

mod path;

mod session;
pub use session::{DirEntry, DirSession, FileSession};

mod registry;
pub use registry::{MountRegistry, OpenFlags};

// Unused crate lint workaround for dev dependencies not exercised from
// within this crate's own test modules (criterion and tracing-subscriber
// are exercised from benches/bench.rs and manual smoke testing instead).
#[cfg(test)]
use criterion as _;
#[cfg(test)]
use proptest as _;
#[cfg(test)]
use tracing_subscriber as _;
