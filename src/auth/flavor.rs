use std::{
    convert::TryFrom,
    io::{Cursor, Write},
};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{auth::AuthUnixParams, Error, Opaque};

const AUTH_NONE: u32 = 0;
const AUTH_UNIX: u32 = 1;
const AUTH_SHORT: u32 = 2;

/// A set of basic auth flavor types
/// [described](https://tools.ietf.org/html/rfc5531#section-8.2) in RFC 5531.
///
/// The deprecated `AUTH_DH` is not supported, nor is GSS.
#[non_exhaustive]
#[derive(Debug, PartialEq, Clone)]
pub enum AuthFlavor<T>
where
    T: AsRef<[u8]>,
{
    /// `AUTH_NONE` with the opaque data the spec allows to be included
    /// (typically `None`).
    ///
    /// The provided opaque auth payload must not exceed 200 bytes in length.
    AuthNone(Option<T>),

    /// `AUTH_UNIX` and the fields it contains.
    AuthUnix(AuthUnixParams<T>),

    /// `AUTH_SHORT` and its opaque identifier
    ///
    /// The provided opaque auth payload must not exceed 200 bytes in length.
    AuthShort(T),

    /// An authentication credential unknown to this library, but possibly valid
    /// and acceptable by the server.
    Unknown {
        /// The discriminator for this undefined auth type.
        id: u32,

        /// The opaque data contained within the this flavour.
        ///
        /// This payload must not exceed 200 bytes in length.
        data: T,
    },
}

impl<'a> AuthFlavor<&'a [u8]> {
    pub(crate) fn from_cursor(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        // Read the auth type
        let flavor = r.read_u32::<BigEndian>()?;

        let flavor = match flavor {
            AUTH_NONE => AuthFlavor::new_none(r)?,
            AUTH_UNIX => AuthFlavor::new_unix(r)?,
            AUTH_SHORT => AuthFlavor::new_short(r)?,
            // 3 => AuthFlavor::AuthDH,
            // 6 => AuthFlavor::RpcSecGSS,
            v => AuthFlavor::Unknown {
                id: v,
                data: Opaque::<&[u8]>::from_wire(r, 200)?.into_inner(),
            },
        };

        Ok(flavor)
    }

    fn new_none(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        let payload = Opaque::<&[u8]>::from_wire(r, 200)?.into_inner();
        if payload.is_empty() {
            return Ok(AuthFlavor::AuthNone(None));
        }

        Ok(AuthFlavor::AuthNone(Some(payload)))
    }

    fn new_unix(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        // TODO(dom): move this into callee
        let len = r.read_u32::<BigEndian>()?;
        if len > 200 {
            return Err(Error::InvalidLength);
        }

        Ok(AuthFlavor::AuthUnix(AuthUnixParams::from_cursor(r, len)?))
    }

    fn new_short(r: &mut Cursor<&'a [u8]>) -> Result<Self, Error> {
        Ok(AuthFlavor::AuthShort(
            Opaque::<&[u8]>::from_wire(r, 200)?.into_inner(),
        ))
    }
}

impl<T> AuthFlavor<T>
where
    T: AsRef<[u8]>,
{
    /// Serialises this auth flavor and writes it into buf.
    ///
    /// # Panics
    ///
    /// Panics if an associated byte payload is provided that exceeds 200 bytes.
    pub fn serialise_into<W: Write>(&self, mut buf: W) -> Result<(), std::io::Error> {
        buf.write_u32::<BigEndian>(self.id())?;

        // Validate the payload length.
        assert!(self.associated_data_len() <= 200);

        // Write the actual auth data
        match self {
            // Opaque payloads serialise their length prefix internally.
            Self::AuthNone(Some(data)) | Self::AuthShort(data) | Self::Unknown { data, .. } => {
                Opaque::from_user_payload(data).serialise_into(&mut buf)
            }
            // No payload has a length of 0.
            Self::AuthNone(None) => {
                buf.write_u32::<BigEndian>(0)?;
                Ok(())
            }
            // Auth unix payloads have their length serialised by the caller.
            Self::AuthUnix(p) => {
                buf.write_u32::<BigEndian>(p.serialised_len())?;
                p.serialise_into(buf)
            }
        }
    }

    /// Returns the ID value used to identify the variant in the wire protocol.
    pub fn id(&self) -> u32 {
        match self {
            Self::AuthNone(_) => AUTH_NONE,
            Self::AuthUnix(_) => AUTH_UNIX,
            Self::AuthShort(_) => AUTH_SHORT,
            Self::Unknown { id, data: _ } => *id,
        }
    }

    /// Returns the byte length of the associated auth data, if any.
    pub fn associated_data_len(&self) -> u32 {
        match self {
            Self::AuthNone(Some(d)) => d.as_ref().len() as u32,
            Self::AuthNone(None) => 0,
            Self::AuthUnix(p) => p.associated_data_len(),
            Self::AuthShort(d) => d.as_ref().len() as u32,
            Self::Unknown { id: _id, data } => data.as_ref().len() as u32,
        }
    }

    /// Returns the on-wire length of this auth flavor once serialised,
    /// including discriminator and length values.
    pub fn serialised_len(&self) -> u32 {
        let mut l = 0;

        // Flavor discriminator
        l += 4;

        // Add the flavor size
        l += match self {
            #[allow(clippy::identity_op)]
            Self::AuthNone(None) => {
                // length prefix u32 + data length
                4 + 0
            }
            Self::AuthUnix(ref p) => 4 + p.serialised_len(),
            Self::Unknown { data, .. } | Self::AuthShort(data) | Self::AuthNone(Some(data)) => {
                Opaque::from_user_payload(data).serialised_len()
            }
        };

        l
    }
}

impl<'a> TryFrom<&'a [u8]> for AuthFlavor<&'a [u8]> {
    type Error = Error;

    fn try_from(v: &'a [u8]) -> Result<Self, Self::Error> {
        let mut c = Cursor::new(v);
        AuthFlavor::from_cursor(&mut c)
    }
}
