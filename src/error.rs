//! When encoding or decoding ASN.1 data goes wrong.

use std::convert::TryFrom;
use std::fmt::{Debug, Display};

use crate::types::TagClass;

pub type Result<T> = std::result::Result<T, Error>;

// --- ByteOffset -----------------------------------------------------------------------------------------------------

/// A position in the byte buffer being decoded, for error reporting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ByteOffset(pub u64);

impl std::ops::Deref for ByteOffset {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u64> for ByteOffset {
    fn from(v: u64) -> Self {
        ByteOffset(v)
    }
}

impl TryFrom<usize> for ByteOffset {
    type Error = ();

    fn try_from(value: usize) -> std::result::Result<Self, Self::Error> {
        if value < (u64::MAX as usize) {
            Ok(ByteOffset(value as u64))
        } else {
            Err(())
        }
    }
}

impl<T> From<&std::io::Cursor<T>> for ByteOffset {
    fn from(cursor: &std::io::Cursor<T>) -> Self {
        ByteOffset(cursor.position())
    }
}

// --- ErrorKind ------------------------------------------------------------------------------------------------------

/// The three failure classes of the codec.
///
/// The distinction between [ErrorKind::PartialPdu] and [ErrorKind::Encoder] is the sole mechanism
/// by which a streaming caller learns that it should read more bytes and retry: a partial PDU is
/// only ever reported for a shortfall at the root of a decode, never for a shortfall inside an
/// already-delimited constructed value.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Caller misuse at the API boundary, e.g. decoding an empty buffer or completing a value
    /// that is not `Incomplete`.
    InvalidArgument(String),

    /// The input is syntactically consistent so far but ends before the root TLV is complete.
    PartialPdu(String),

    /// The bytes or the value violate a BER/DER rule.
    Encoder(String),
}

impl ErrorKind {
    /// The human readable message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            ErrorKind::InvalidArgument(msg) => msg,
            ErrorKind::PartialPdu(msg) => msg,
            ErrorKind::Encoder(msg) => msg,
        }
    }
}

// --- ErrorLocation --------------------------------------------------------------------------------------------------

/// Where in the byte stream an error was observed.
///
/// Errors raised while validating a value tree prior to encoding have no meaningful byte offset
/// and report an unknown location.
#[derive(Clone, Debug, Default)]
pub struct ErrorLocation {
    offset: Option<ByteOffset>,
    tag: Option<(TagClass, u32)>,
}

impl From<ByteOffset> for ErrorLocation {
    fn from(offset: ByteOffset) -> Self {
        Self {
            offset: Some(offset),
            ..Default::default()
        }
    }
}

impl From<u64> for ErrorLocation {
    fn from(offset: u64) -> Self {
        Self::from(ByteOffset(offset))
    }
}

impl From<usize> for ErrorLocation {
    fn from(value: usize) -> ErrorLocation {
        match ByteOffset::try_from(value) {
            Ok(offset) => ErrorLocation::from(offset),
            Err(_) => ErrorLocation::unknown(),
        }
    }
}

impl<T> From<&std::io::Cursor<T>> for ErrorLocation {
    fn from(cursor: &std::io::Cursor<T>) -> Self {
        Self {
            offset: Some(cursor.position().into()),
            ..Default::default()
        }
    }
}

impl Display for ErrorLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_unknown() {
            return f.write_str("Unknown");
        }

        let mut sep_str = "";

        #[rustfmt::skip]
        let mut sep = || { let s = sep_str; sep_str = ", "; s };

        if let Some(offset) = self.offset {
            f.write_fmt(format_args!("{}pos: {} bytes", sep(), *offset))?;
        }
        if let Some((class, number)) = self.tag {
            f.write_fmt(format_args!("{}tag: {} {}", sep(), class, number))?;
        }

        Ok(())
    }
}

impl ErrorLocation {
    pub(crate) fn unknown() -> Self {
        Self::default()
    }

    pub(crate) fn with_tag(mut self, class: TagClass, number: u32) -> Self {
        let _ = self.tag.get_or_insert((class, number));
        self
    }

    pub fn is_unknown(&self) -> bool {
        matches!((self.offset, self.tag), (None, None))
    }

    pub fn offset(&self) -> Option<ByteOffset> {
        self.offset
    }

    pub fn tag(&self) -> Option<(TagClass, u32)> {
        self.tag
    }
}

// --- Error ----------------------------------------------------------------------------------------------------------

/// An error raised by [Codec::encode](crate::Codec::encode), [Codec::decode](crate::Codec::decode)
/// or [Codec::complete](crate::Codec::complete), pinpointing where in the byte stream the problem
/// occurred when that is known.
#[derive(Debug)]
#[non_exhaustive]
pub struct Error {
    kind: ErrorKind,
    location: ErrorLocation,
}

impl Error {
    pub fn new(kind: ErrorKind, location: ErrorLocation) -> Self {
        Self { kind, location }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn location(&self) -> &ErrorLocation {
        &self.location
    }

    /// The human readable message carried by this error.
    pub fn message(&self) -> &str {
        self.kind.message()
    }

    pub fn into_inner(self) -> (ErrorKind, ErrorLocation) {
        (self.kind, self.location)
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ErrorKind::InvalidArgument(msg) => f.write_fmt(format_args!("Invalid argument: {}", msg)),
            ErrorKind::PartialPdu(msg) => {
                f.write_fmt(format_args!("Partial PDU: {} (at {})", msg, self.location))
            }
            ErrorKind::Encoder(msg) => {
                f.write_fmt(format_args!("Encoding error: {} (at {})", msg, self.location))
            }
        }
    }
}

impl Error {
    pub(crate) fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::InvalidArgument(msg.into()), ErrorLocation::unknown())
    }

    pub(crate) fn encoder<S: Into<String>>(msg: S) -> Self {
        Self::new(ErrorKind::Encoder(msg.into()), ErrorLocation::unknown())
    }

    pub(crate) fn pinpoint<L>(kind: ErrorKind, location: L) -> Self
    where
        ErrorLocation: From<L>,
    {
        Self {
            kind,
            location: location.into(),
        }
    }

    pub(crate) fn pinpoint_with_tag<L>(kind: ErrorKind, location: L, class: TagClass, number: u32) -> Self
    where
        ErrorLocation: From<L>,
    {
        Self {
            kind,
            location: ErrorLocation::from(location).with_tag(class, number),
        }
    }
}
