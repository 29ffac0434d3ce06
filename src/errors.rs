use thiserror::Error;

/// Error types returned by this crate.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// The message type in the RPC request is neither [`MessageType::Call`]
    /// or [`MessageType::Reply`].
    ///
    /// This is a violation of the spec.
    ///
    /// [`MessageType::Call`]: crate::MessageType::Call
    /// [`MessageType::Reply`]: crate::MessageType::Reply
    #[error("invalid rpc message type {0}")]
    InvalidMessageType(u32),

    /// The message type in the RPC request is neither [`ReplyBody::Accepted`]
    /// or [`ReplyBody::Denied`].
    ///
    /// This is a violation of the spec.
    ///
    /// [`ReplyBody::Accepted`]: crate::ReplyBody::Accepted
    /// [`ReplyBody::Denied`]: crate::ReplyBody::Denied
    #[error("invalid rpc reply type {0}")]
    InvalidReplyType(u32),

    /// The reply status code is not one of the specified [status
    /// codes](crate::AcceptedStatus).
    ///
    /// This is a violation of the spec.
    #[error("invalid rpc reply status {0}")]
    InvalidReplyStatus(u32),

    /// The auth or verifier is invalid or malformed.
    #[error("invalid rpc auth data")]
    InvalidAuthData,

    /// The auth error code is not one of the specified [error
    /// codes](crate::AuthError).
    ///
    /// This is a violation of the spec.
    #[error("invalid rpc auth error status {0}")]
    InvalidAuthError(u32),

    /// The rejected reply status code is not one of the specified [status
    /// codes](crate::RejectedReply).
    ///
    /// This is a violation of the spec.
    #[error("invalid rpc rejected reply type {0}")]
    InvalidRejectedReplyType(u32),

    /// A variable length type has a malformed length value which would exceed
    /// the length of the buffer.
    #[error("invalid length in rpc message")]
    InvalidLength,

    /// The message contains a rpc protocol identifier that is not 2.
    #[error("invalid rpc version {0}")]
    InvalidRpcVersion(u32),

    /// The [machine name](crate::auth::AuthUnixParams::machine_name) contains
    /// non-UTF8 characters.
    #[error("invalid machine name: {0}")]
    InvalidMachineName(#[from] std::str::Utf8Error),

    /// A datagram was shorter, or longer, than the message it was supposed to
    /// contain.
    #[error("malformed rpc datagram (got {buffer_len} bytes, expected {expected})")]
    IncompleteMessage {
        /// The length of the buffer provided.
        buffer_len: usize,

        /// The length expected for this message type.
        expected: usize,
    },

    /// No device is registered under the given short name.
    #[error("no device named {0:?}")]
    NoDevice(String),

    /// A path could not be parsed (unexpected device prefix, empty
    /// component, or similar).
    #[error("invalid path {0:?}")]
    InvalidPath(String),

    /// A write, create, mkdir, remove, rmdir or rename was attempted against a
    /// mount opened read-only.
    #[error("file system is mounted read-only")]
    ReadOnlyFs,

    /// `O_CREAT|O_EXCL` was used against an already-existing object.
    #[error("object already exists")]
    Exists,

    /// The requested path does not exist.
    #[error("no such file or directory")]
    NoEntry,

    /// A directory-only operation was used against a non-directory object.
    #[error("not a directory")]
    NotADirectory,

    /// An operation was attempted against a file/directory handle that isn't
    /// open, or is of the wrong kind for the operation.
    #[error("bad file descriptor")]
    BadFileDescriptor,

    /// The combination of arguments given to an operation is not valid (e.g.
    /// seeking to a negative offset).
    #[error("invalid argument")]
    Invalid,

    /// An I/O error occurred on the underlying socket.
    #[error("i/o error ({0:?}): {1}")]
    Io(std::io::ErrorKind, String),

    /// The server rejected the RPC call outright (bad RPC version or
    /// authentication failure), as opposed to accepting it and returning a
    /// procedure-level failure.
    #[error("rpc call rejected: {0:?}")]
    RpcRejected(crate::reply::RejectedReply),

    /// The server accepted the RPC call but could not execute it.
    #[error("rpc call not executed: {0:?}")]
    RpcAccepted(RpcAcceptedError),

    /// The NFSv3 procedure returned a non-zero `nfsstat3` value.
    #[error("nfs error {0}")]
    NfsError(u32),

    /// The MOUNT procedure returned a non-zero `mountstat3` value.
    #[error("mount failed with status {0}")]
    MountFailed(u32),

    /// The portmapper has no UDP port registered for the requested program.
    #[error("program unavailable on remote host")]
    ProgramUnavailable,

    /// The UDP retry budget was exhausted without a matching reply arriving.
    #[error("rpc call timed out")]
    Timeout,

    /// An encoder ran out of room in the scratch buffer.
    #[error("buffer overflow serialising rpc message")]
    BufferOverflow,

    /// The server's write verifier changed between two `WRITE` calls in the
    /// same write operation, indicating the server restarted and discarded
    /// unstably-written data.
    #[error("server write verifier changed, data may have been lost")]
    WriteVerifierChanged,
}

/// The subset of [`AcceptedStatus`](crate::AcceptedStatus) that indicates
/// failure (the `Success` variant is unwrapped by the caller, never surfaced
/// as an error).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RpcAcceptedError {
    /// `PROG_UNAVAIL`
    ProgramUnavailable,
    /// `PROG_MISMATCH`
    ProgramMismatch {
        /// Lowest version the server supports.
        low: u32,
        /// Highest version the server supports.
        high: u32,
    },
    /// `PROC_UNAVAIL`
    ProcedureUnavailable,
    /// `GARBAGE_ARGS`
    GarbageArgs,
    /// `SYSTEM_ERR`
    SystemError,
}

impl From<std::io::Error> for Error {
    fn from(v: std::io::Error) -> Self {
        // A `Cursor` read running past the end of the underlying slice means
        // the datagram was truncated mid-structure; report that the same way
        // as the top-level length check in `RpcMessage::from_datagram`.
        if v.kind() == std::io::ErrorKind::UnexpectedEof {
            return Self::IncompleteMessage {
                buffer_len: 0,
                expected: 0,
            };
        }

        Self::Io(v.kind(), v.to_string())
    }
}
