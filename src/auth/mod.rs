//! A set of basic auth flavors specified in RFC 5531.

mod flavor;
mod unix_params;

pub use flavor::*;
pub use unix_params::*;

/// Builds the `AUTH_UNIX` credential this client presents on every call.
///
/// The auxiliary gids array is always empty; per-mount identity is numeric
/// uid/gid only (see crate-level non-goals around idmapping).
pub(crate) fn unix_credential(stamp: u32, machine_name: &[u8], uid: u32, gid: u32) -> AuthFlavor<&[u8]> {
    AuthFlavor::AuthUnix(AuthUnixParams::new(stamp, machine_name, uid, gid, None))
}
