//! ASN.1 BER and DER encoding and decoding per ITU-T X.690.
//!
//! This crate models ASN.1 values as a tree of [Value]s and converts them to and from
//! tag-length-value byte streams under the Basic Encoding Rules or the Distinguished Encoding
//! Rules. It exists to serve protocol stacks such as LDAP, X.509 and Kerberos that need to
//! interoperate with other implementations at the byte level.
//!
//! A [Codec] instance carries the options and tag maps for one ruleset:
//!
//! ```
//! use asn1_ber::{Codec, Value};
//!
//! # fn main() -> asn1_ber::Result<()> {
//! let codec = Codec::ber();
//!
//! let bytes = codec.encode(&Value::sequence(vec![
//!     Value::integer(27066),
//!     Value::utf8_string("hello"),
//! ]))?;
//!
//! assert_eq!(codec.decode(&bytes)?.children().map(|c| c.len()), Some(2));
//! # Ok(())
//! # }
//! ```
//!
//! Decoding reads exactly one TLV from the front of the input. A buffer that ends before the
//! root TLV is complete fails with [ErrorKind::PartialPdu] so that a caller holding a socket
//! knows to read more bytes and retry; bytes left over after a complete TLV are attached to the
//! returned value as [trailing data](Value::trailing_data). Non-universal tags are resolved
//! through the codec's [TagMap]; tags the map does not know come back as
//! [Incomplete](types::Kind::Incomplete) values that can be resolved later with
//! [Codec::complete].
//!
//! Indefinite lengths, CER, and the REAL / EXTERNAL / EMBEDDED PDV types are out of scope and
//! rejected.

#[macro_use]
mod macros;

mod de;
mod ser;

pub mod codec;
pub mod error;
pub mod map;
pub mod types;
pub mod util;

pub use codec::{Codec, CodecOptions, EncodingRules};
pub use error::{Error, ErrorKind, Result};
pub use map::TagMap;
pub use types::{DateTimeFormat, Kind, StringType, TagClass, TimeValue, TimeZoneFormat, UniversalType, Value};

#[cfg(test)]
mod tests;
