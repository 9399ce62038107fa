//! The public codec surface: construction, options and the encode/decode/complete operations.

use std::collections::HashMap;
use std::fmt::Display;

use log::debug;
use log::log_enabled;
use log::Level::Debug;

use crate::de;
use crate::error::Result;
use crate::map::TagMap;
use crate::ser;
use crate::types::{TagClass, UniversalType, Value};
use crate::util;

// --- EncodingRules --------------------------------------------------------------------------------------------------

/// Which X.690 ruleset the codec applies. DER is BER tightened to a single canonical encoding
/// per value; CER is not supported.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EncodingRules {
    Ber,
    Der,
}

impl Display for EncodingRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingRules::Ber => f.write_str("BER"),
            EncodingRules::Der => f.write_str("DER"),
        }
    }
}

// --- CodecOptions ---------------------------------------------------------------------------------------------------

/// The recognised codec options.
#[derive(Clone, Debug)]
pub struct CodecOptions {
    /// The concrete bit character used to pad a BIT STRING out to a whole number of octets on
    /// encode. DER forces `'0'`.
    bitstring_padding: char,

    /// The universal types whose constructed encoding is forbidden, on top of the types X.690
    /// defines as structurally primitive. BER starts empty; DER preloads every
    /// character-restricted string plus BIT STRING and OCTET STRING.
    primitive_only: Vec<UniversalType>,
}

impl CodecOptions {
    pub fn new() -> Self {
        Self {
            bitstring_padding: '0',
            primitive_only: Vec::new(),
        }
    }

    pub fn with_bitstring_padding(mut self, padding: char) -> Self {
        self.bitstring_padding = padding;
        self
    }

    pub fn with_primitive_only(mut self, types: Vec<UniversalType>) -> Self {
        self.primitive_only = types;
        self
    }

    pub fn bitstring_padding(&self) -> char {
        self.bitstring_padding
    }

    pub fn primitive_only(&self) -> &[UniversalType] {
        &self.primitive_only
    }

    pub(crate) fn is_primitive_only(&self, universal: UniversalType) -> bool {
        self.primitive_only.contains(&universal)
    }

    fn der_defaults() -> Self {
        let mut primitive_only: Vec<UniversalType> = (0x01..=0x1E)
            .filter_map(UniversalType::from_number)
            .filter(|t| t.is_character_restricted())
            .collect();
        primitive_only.push(UniversalType::BitString);
        primitive_only.push(UniversalType::OctetString);
        Self {
            bitstring_padding: '0',
            primitive_only,
        }
    }
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self::new()
    }
}

// --- Codec ----------------------------------------------------------------------------------------------------------

/// A BER or DER codec instance: an options table plus the tag map registry used to resolve
/// non-universal tags during decode.
///
/// Operations take `&self`; the only mutation is [Codec::set_type_map], so the intended pattern
/// is build-then-freeze, after which an instance is safe to share across concurrent callers.
///
/// ```
/// use asn1_ber::{Codec, Value};
///
/// # fn main() -> asn1_ber::Result<()> {
/// let codec = Codec::ber();
/// let bytes = codec.encode(&Value::sequence(vec![Value::integer(1), Value::boolean(true)]))?;
/// let value = codec.decode(&bytes)?;
/// assert_eq!(value.children().map(|c| c.len()), Some(2));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Codec {
    rules: EncodingRules,
    options: CodecOptions,
    tag_map: TagMap,
}

impl Codec {
    /// A BER codec with the default options and the default (LDAP) APPLICATION tag map.
    pub fn ber() -> Self {
        Self {
            rules: EncodingRules::Ber,
            options: CodecOptions::new(),
            tag_map: TagMap::default(),
        }
    }

    /// A DER codec: zero bit-string padding and the full primitive-only table.
    pub fn der() -> Self {
        Self {
            rules: EncodingRules::Der,
            options: CodecOptions::der_defaults(),
            tag_map: TagMap::default(),
        }
    }

    /// A codec with caller-supplied options. DER always pads bit strings with zero bits, whatever
    /// the options say.
    pub fn with_options(rules: EncodingRules, mut options: CodecOptions) -> Self {
        if rules == EncodingRules::Der {
            options.bitstring_padding = '0';
        }
        Self {
            rules,
            options,
            tag_map: TagMap::default(),
        }
    }

    pub fn rules(&self) -> EncodingRules {
        self.rules
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    pub fn tag_map(&self) -> &TagMap {
        &self.tag_map
    }

    /// Replace the tag mappings for one non-universal class.
    pub fn set_type_map(&mut self, class: TagClass, map: HashMap<u32, UniversalType>) -> Result<&mut Self> {
        self.tag_map.set(class, map)?;
        Ok(self)
    }

    /// Encode a value tree to bytes.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let bytes = ser::to_vec(value, self.rules, &self.options)?;

        if log_enabled!(Debug) {
            debug!("Encoded binary {}: {}", self.rules, hex::encode_upper(&bytes));
            debug!("{}", util::to_string(&bytes));
        }

        Ok(bytes)
    }

    /// Decode exactly one TLV from the front of `bytes`. Input bytes past the first complete TLV
    /// are attached to the returned root value as trailing data.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        de::from_slice(bytes, self.rules, &self.options, &self.tag_map, None)
    }

    /// Like [Codec::decode], consulting `overlay` before this codec's own tag map when resolving
    /// non-universal tags.
    pub fn decode_with_map(&self, bytes: &[u8], overlay: &TagMap) -> Result<Value> {
        de::from_slice(bytes, self.rules, &self.options, &self.tag_map, Some(overlay))
    }

    /// Re-parse the payload of an `Incomplete` value as the given universal type, preserving the
    /// original tag class and number. Higher level protocols use this when a tag's semantic type
    /// only becomes known after structural parsing.
    pub fn complete(&self, value: &Value, universal: UniversalType) -> Result<Value> {
        de::complete(value, universal, self.rules, &self.options, &self.tag_map, None)
    }

    /// Like [Codec::complete], consulting `overlay` first for any nested non-universal tags.
    pub fn complete_with_map(&self, value: &Value, universal: UniversalType, overlay: &TagMap) -> Result<Value> {
        de::complete(value, universal, self.rules, &self.options, &self.tag_map, Some(overlay))
    }
}

// --- Tests ----------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    #[allow(unused_imports)]
    use pretty_assertions::{assert_eq, assert_ne};

    use super::*;

    #[test]
    fn test_der_defaults_forbid_constructed_strings() {
        let codec = Codec::der();
        assert!(codec.options().is_primitive_only(UniversalType::OctetString));
        assert!(codec.options().is_primitive_only(UniversalType::BitString));
        assert!(codec.options().is_primitive_only(UniversalType::Utf8String));
        assert!(codec.options().is_primitive_only(UniversalType::BmpString));
        assert!(!codec.options().is_primitive_only(UniversalType::Sequence));
        assert_eq!(codec.options().primitive_only().len(), 14);
    }

    #[test]
    fn test_der_forces_zero_bitstring_padding() {
        let options = CodecOptions::new().with_bitstring_padding('1');
        let codec = Codec::with_options(EncodingRules::Der, options.clone());
        assert_eq!(codec.options().bitstring_padding(), '0');

        let codec = Codec::with_options(EncodingRules::Ber, options);
        assert_eq!(codec.options().bitstring_padding(), '1');
    }

    #[test]
    fn test_set_type_map_rejects_the_universal_class() {
        let mut codec = Codec::ber();
        assert!(codec.set_type_map(TagClass::Universal, HashMap::new()).is_err());
        assert!(codec.set_type_map(TagClass::Context, HashMap::new()).is_ok());
    }
}
