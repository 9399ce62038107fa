//! The ASN.1 value model: tag classes, universal types and the value tree.

use std::fmt::Display;

use chrono::{FixedOffset, NaiveDateTime, Timelike};

// --- TagClass -------------------------------------------------------------------------------------------------------

// X.690 8.1.2.2: "bits 8 and 7 shall be encoded to represent the class of the tag: Universal 00,
// Application 01, Context-specific 10, Private 11".
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TagClass {
    Universal,
    Application,
    Context,
    Private,
}

impl TagClass {
    /// The class bits of the leading identifier octet (bits 8 and 7).
    pub fn bits(self) -> u8 {
        match self {
            TagClass::Universal => 0x00,
            TagClass::Application => 0x40,
            TagClass::Context => 0x80,
            TagClass::Private => 0xC0,
        }
    }

    pub(crate) fn from_identifier(octet: u8) -> Self {
        match octet & 0xC0 {
            0x00 => TagClass::Universal,
            0x40 => TagClass::Application,
            0x80 => TagClass::Context,
            _ => TagClass::Private,
        }
    }

    // Canonical class order for DER SET member sorting.
    pub(crate) fn rank(self) -> u8 {
        match self {
            TagClass::Universal => 0,
            TagClass::Application => 1,
            TagClass::Context => 2,
            TagClass::Private => 3,
        }
    }
}

impl Display for TagClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagClass::Universal => f.write_str("UNIVERSAL"),
            TagClass::Application => f.write_str("APPLICATION"),
            TagClass::Context => f.write_str("CONTEXT"),
            TagClass::Private => f.write_str("PRIVATE"),
        }
    }
}

// --- UniversalType --------------------------------------------------------------------------------------------------

/// The universal tag numbers supported by the codec.
///
/// REAL, EXTERNAL, EMBEDDED PDV and the other X.680 types with no entry here are out of scope;
/// decoding their tag numbers is an error rather than an `Incomplete`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UniversalType {
    Boolean,
    Integer,
    BitString,
    OctetString,
    Null,
    Oid,
    Enumerated,
    Utf8String,
    RelativeOid,
    Sequence,
    Set,
    NumericString,
    PrintableString,
    TeletexString,
    VideotexString,
    Ia5String,
    UtcTime,
    GeneralizedTime,
    GraphicString,
    VisibleString,
    GeneralString,
    UniversalString,
    CharacterString,
    BmpString,
}

impl UniversalType {
    /// The tag number assigned by X.680.
    pub fn number(self) -> u32 {
        match self {
            UniversalType::Boolean => 0x01,
            UniversalType::Integer => 0x02,
            UniversalType::BitString => 0x03,
            UniversalType::OctetString => 0x04,
            UniversalType::Null => 0x05,
            UniversalType::Oid => 0x06,
            UniversalType::Enumerated => 0x0A,
            UniversalType::Utf8String => 0x0C,
            UniversalType::RelativeOid => 0x0D,
            UniversalType::Sequence => 0x10,
            UniversalType::Set => 0x11,
            UniversalType::NumericString => 0x12,
            UniversalType::PrintableString => 0x13,
            UniversalType::TeletexString => 0x14,
            UniversalType::VideotexString => 0x15,
            UniversalType::Ia5String => 0x16,
            UniversalType::UtcTime => 0x17,
            UniversalType::GeneralizedTime => 0x18,
            UniversalType::GraphicString => 0x19,
            UniversalType::VisibleString => 0x1A,
            UniversalType::GeneralString => 0x1B,
            UniversalType::UniversalString => 0x1C,
            UniversalType::CharacterString => 0x1D,
            UniversalType::BmpString => 0x1E,
        }
    }

    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            0x01 => Some(UniversalType::Boolean),
            0x02 => Some(UniversalType::Integer),
            0x03 => Some(UniversalType::BitString),
            0x04 => Some(UniversalType::OctetString),
            0x05 => Some(UniversalType::Null),
            0x06 => Some(UniversalType::Oid),
            0x0A => Some(UniversalType::Enumerated),
            0x0C => Some(UniversalType::Utf8String),
            0x0D => Some(UniversalType::RelativeOid),
            0x10 => Some(UniversalType::Sequence),
            0x11 => Some(UniversalType::Set),
            0x12 => Some(UniversalType::NumericString),
            0x13 => Some(UniversalType::PrintableString),
            0x14 => Some(UniversalType::TeletexString),
            0x15 => Some(UniversalType::VideotexString),
            0x16 => Some(UniversalType::Ia5String),
            0x17 => Some(UniversalType::UtcTime),
            0x18 => Some(UniversalType::GeneralizedTime),
            0x19 => Some(UniversalType::GraphicString),
            0x1A => Some(UniversalType::VisibleString),
            0x1B => Some(UniversalType::GeneralString),
            0x1C => Some(UniversalType::UniversalString),
            0x1D => Some(UniversalType::CharacterString),
            0x1E => Some(UniversalType::BmpString),
            _ => None,
        }
    }

    /// True for the string variants DER forbids from using a constructed encoding. OCTET STRING
    /// is deliberately not in this set; it has its own entry in the DER primitive-only table.
    pub fn is_character_restricted(self) -> bool {
        matches!(
            self,
            UniversalType::Utf8String
                | UniversalType::NumericString
                | UniversalType::PrintableString
                | UniversalType::TeletexString
                | UniversalType::VideotexString
                | UniversalType::Ia5String
                | UniversalType::GraphicString
                | UniversalType::VisibleString
                | UniversalType::GeneralString
                | UniversalType::UniversalString
                | UniversalType::CharacterString
                | UniversalType::BmpString
        )
    }

    // X.690 defines these as primitive-only in every ruleset, not just under DER.
    pub(crate) fn is_structurally_primitive(self) -> bool {
        matches!(
            self,
            UniversalType::Boolean
                | UniversalType::Integer
                | UniversalType::Enumerated
                | UniversalType::Null
                | UniversalType::Oid
                | UniversalType::RelativeOid
        )
    }

    fn name(self) -> &'static str {
        match self {
            UniversalType::Boolean => "BOOLEAN",
            UniversalType::Integer => "INTEGER",
            UniversalType::BitString => "BIT STRING",
            UniversalType::OctetString => "OCTET STRING",
            UniversalType::Null => "NULL",
            UniversalType::Oid => "OBJECT IDENTIFIER",
            UniversalType::Enumerated => "ENUMERATED",
            UniversalType::Utf8String => "UTF8 STRING",
            UniversalType::RelativeOid => "RELATIVE OID",
            UniversalType::Sequence => "SEQUENCE",
            UniversalType::Set => "SET",
            UniversalType::NumericString => "NUMERIC STRING",
            UniversalType::PrintableString => "PRINTABLE STRING",
            UniversalType::TeletexString => "TELETEX STRING",
            UniversalType::VideotexString => "VIDEOTEX STRING",
            UniversalType::Ia5String => "IA5 STRING",
            UniversalType::UtcTime => "UTC TIME",
            UniversalType::GeneralizedTime => "GENERALIZED TIME",
            UniversalType::GraphicString => "GRAPHIC STRING",
            UniversalType::VisibleString => "VISIBLE STRING",
            UniversalType::GeneralString => "GENERAL STRING",
            UniversalType::UniversalString => "UNIVERSAL STRING",
            UniversalType::CharacterString => "CHARACTER STRING",
            UniversalType::BmpString => "BMP STRING",
        }
    }
}

impl Display for UniversalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{} (0x{:02X})", self.name(), self.number()))
    }
}

// --- StringType -----------------------------------------------------------------------------------------------------

/// Static descriptor for the twelve character-restricted string variants.
///
/// All of them share one payload shape (a text string); the descriptor carries the only thing
/// that differs between them, the universal tag number. This keeps the per-variant encode and
/// decode logic table driven instead of duplicated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StringType {
    Utf8,
    Numeric,
    Printable,
    Teletex,
    Videotex,
    Ia5,
    Graphic,
    Visible,
    General,
    Universal,
    Character,
    Bmp,
}

impl StringType {
    pub fn universal_type(self) -> UniversalType {
        match self {
            StringType::Utf8 => UniversalType::Utf8String,
            StringType::Numeric => UniversalType::NumericString,
            StringType::Printable => UniversalType::PrintableString,
            StringType::Teletex => UniversalType::TeletexString,
            StringType::Videotex => UniversalType::VideotexString,
            StringType::Ia5 => UniversalType::Ia5String,
            StringType::Graphic => UniversalType::GraphicString,
            StringType::Visible => UniversalType::VisibleString,
            StringType::General => UniversalType::GeneralString,
            StringType::Universal => UniversalType::UniversalString,
            StringType::Character => UniversalType::CharacterString,
            StringType::Bmp => UniversalType::BmpString,
        }
    }

    pub(crate) fn from_universal(universal: UniversalType) -> Option<Self> {
        match universal {
            UniversalType::Utf8String => Some(StringType::Utf8),
            UniversalType::NumericString => Some(StringType::Numeric),
            UniversalType::PrintableString => Some(StringType::Printable),
            UniversalType::TeletexString => Some(StringType::Teletex),
            UniversalType::VideotexString => Some(StringType::Videotex),
            UniversalType::Ia5String => Some(StringType::Ia5),
            UniversalType::GraphicString => Some(StringType::Graphic),
            UniversalType::VisibleString => Some(StringType::Visible),
            UniversalType::GeneralString => Some(StringType::General),
            UniversalType::UniversalString => Some(StringType::Universal),
            UniversalType::CharacterString => Some(StringType::Character),
            UniversalType::BmpString => Some(StringType::Bmp),
            _ => None,
        }
    }
}

// --- TimeValue ------------------------------------------------------------------------------------------------------

/// The finest datetime field present in the textual form of a time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DateTimeFormat {
    Hours,
    Minutes,
    Seconds,
    Fractions,
}

/// How the timezone of a time is represented on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimeZoneFormat {
    /// The `Z` suffix.
    Utc,
    /// No suffix at all. Not acceptable for UTCTime.
    Local,
    /// A `+HHMM` or `-HHMM` differential.
    Diff,
}

/// A calendar instant as carried by UTCTime and GeneralizedTime values.
///
/// The value remembers how it was (or will be) rendered: which datetime fields are present and
/// which timezone representation is used. Fractional seconds are held as the sub-second
/// milliseconds of `datetime` and only rendered when the format is [DateTimeFormat::Fractions].
#[derive(Clone, Debug, PartialEq)]
pub struct TimeValue {
    pub(crate) datetime: NaiveDateTime,
    pub(crate) datetime_format: DateTimeFormat,
    pub(crate) timezone_format: TimeZoneFormat,
    pub(crate) offset: Option<FixedOffset>,
}

impl TimeValue {
    /// A UTC time with second precision, or fraction precision when `datetime` carries
    /// sub-second milliseconds.
    pub fn utc(datetime: NaiveDateTime) -> Self {
        let millis = (datetime.time().nanosecond() / 1_000_000).min(999);
        let format = if millis == 0 {
            DateTimeFormat::Seconds
        } else {
            DateTimeFormat::Fractions
        };
        Self {
            datetime: truncate(datetime, format),
            datetime_format: format,
            timezone_format: TimeZoneFormat::Utc,
            offset: None,
        }
    }

    /// Re-render this time at a different precision. Fields finer than the requested format are
    /// zeroed so that the value compares equal to its own decoded encoding; a fraction format
    /// with no sub-second part normalises to seconds.
    pub fn with_datetime_format(mut self, format: DateTimeFormat) -> Self {
        let millis = (self.datetime.time().nanosecond() / 1_000_000).min(999);
        let format = if format == DateTimeFormat::Fractions && millis == 0 {
            DateTimeFormat::Seconds
        } else {
            format
        };
        self.datetime = truncate(self.datetime, format);
        self.datetime_format = format;
        self
    }

    pub fn with_timezone_utc(mut self) -> Self {
        self.timezone_format = TimeZoneFormat::Utc;
        self.offset = None;
        self
    }

    pub fn with_timezone_local(mut self) -> Self {
        self.timezone_format = TimeZoneFormat::Local;
        self.offset = None;
        self
    }

    pub fn with_timezone_diff(mut self, offset: FixedOffset) -> Self {
        self.timezone_format = TimeZoneFormat::Diff;
        self.offset = Some(offset);
        self
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    pub fn datetime_format(&self) -> DateTimeFormat {
        self.datetime_format
    }

    pub fn timezone_format(&self) -> TimeZoneFormat {
        self.timezone_format
    }

    /// The differential, when the timezone format is [TimeZoneFormat::Diff].
    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    pub(crate) fn fraction_millis(&self) -> u32 {
        (self.datetime.time().nanosecond() / 1_000_000).min(999)
    }
}

fn truncate(datetime: NaiveDateTime, format: DateTimeFormat) -> NaiveDateTime {
    let time = datetime.time();
    let millis = (time.nanosecond() / 1_000_000).min(999);
    let (minute, second, millis) = match format {
        DateTimeFormat::Hours => (0, 0, 0),
        DateTimeFormat::Minutes => (time.minute(), 0, 0),
        DateTimeFormat::Seconds => (time.minute(), time.second(), 0),
        DateTimeFormat::Fractions => (time.minute(), time.second(), millis),
    };
    datetime
        .date()
        .and_hms_milli_opt(time.hour(), minute, second, millis)
        .unwrap_or(datetime)
}

// --- Value ----------------------------------------------------------------------------------------------------------

/// The payload of a [Value].
///
/// For [Kind::Sequence] and [Kind::Set] the children are the authoritative payload; every other
/// variant carries its payload directly. [Kind::Incomplete] holds the raw content bytes of a
/// non-universal tag the decoder could not resolve through its tag maps.
#[derive(Clone, Debug, PartialEq)]
pub enum Kind {
    Boolean(bool),
    Integer(i64),
    BitString(String),
    OctetString(Vec<u8>),
    Null,
    Oid(String),
    Enumerated(i64),
    RelativeOid(String),
    Sequence(Vec<Value>),
    Set(Vec<Value>),
    CharacterString { string_type: StringType, value: String },
    UtcTime(TimeValue),
    GeneralizedTime(TimeValue),
    Incomplete(Vec<u8>),
}

impl Kind {
    /// The universal type this payload encodes as; `None` for [Kind::Incomplete].
    pub fn universal_type(&self) -> Option<UniversalType> {
        match self {
            Kind::Boolean(_) => Some(UniversalType::Boolean),
            Kind::Integer(_) => Some(UniversalType::Integer),
            Kind::BitString(_) => Some(UniversalType::BitString),
            Kind::OctetString(_) => Some(UniversalType::OctetString),
            Kind::Null => Some(UniversalType::Null),
            Kind::Oid(_) => Some(UniversalType::Oid),
            Kind::Enumerated(_) => Some(UniversalType::Enumerated),
            Kind::RelativeOid(_) => Some(UniversalType::RelativeOid),
            Kind::Sequence(_) => Some(UniversalType::Sequence),
            Kind::Set(_) => Some(UniversalType::Set),
            Kind::CharacterString { string_type, .. } => Some(string_type.universal_type()),
            Kind::UtcTime(_) => Some(UniversalType::UtcTime),
            Kind::GeneralizedTime(_) => Some(UniversalType::GeneralizedTime),
            Kind::Incomplete(_) => None,
        }
    }
}

/// One ASN.1 value: a payload plus the tag envelope it is encoded under.
///
/// Construction helpers produce universally tagged values; [Value::with_tag] re-tags a value for
/// implicit tagging, e.g. `Value::integer(3).with_tag(TagClass::Context, 2)`. Trailing data is
/// only ever populated by the decoder, on the root value, with whatever input bytes followed the
/// first complete TLV.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    kind: Kind,
    class: TagClass,
    number: u32,
    constructed: bool,
    trailing: Option<Vec<u8>>,
}

impl Value {
    fn universal(kind: Kind, constructed: bool) -> Self {
        let number = kind.universal_type().map(|t| t.number()).unwrap_or(0);
        Self {
            kind,
            class: TagClass::Universal,
            number,
            constructed,
            trailing: None,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self::universal(Kind::Boolean(value), false)
    }

    pub fn integer(value: i64) -> Self {
        Self::universal(Kind::Integer(value), false)
    }

    pub fn enumerated(value: i64) -> Self {
        Self::universal(Kind::Enumerated(value), false)
    }

    /// A bit string from a text of `'0'` and `'1'` characters. Leading zeros and the exact bit
    /// count are significant and survive a round trip.
    pub fn bit_string<S: Into<String>>(bits: S) -> Self {
        Self::universal(Kind::BitString(bits.into()), false)
    }

    pub fn octet_string<B: Into<Vec<u8>>>(bytes: B) -> Self {
        Self::universal(Kind::OctetString(bytes.into()), false)
    }

    pub fn null() -> Self {
        Self::universal(Kind::Null, false)
    }

    /// An object identifier in dotted form, e.g. `"1.3.6.1.4.1"`.
    pub fn oid<S: Into<String>>(oid: S) -> Self {
        Self::universal(Kind::Oid(oid.into()), false)
    }

    pub fn relative_oid<S: Into<String>>(oid: S) -> Self {
        Self::universal(Kind::RelativeOid(oid.into()), false)
    }

    pub fn sequence(children: Vec<Value>) -> Self {
        Self::universal(Kind::Sequence(children), true)
    }

    pub fn set(children: Vec<Value>) -> Self {
        Self::universal(Kind::Set(children), true)
    }

    pub fn string<S: Into<String>>(string_type: StringType, value: S) -> Self {
        Self::universal(
            Kind::CharacterString {
                string_type,
                value: value.into(),
            },
            false,
        )
    }

    pub fn utf8_string<S: Into<String>>(value: S) -> Self {
        Self::string(StringType::Utf8, value)
    }

    pub fn printable_string<S: Into<String>>(value: S) -> Self {
        Self::string(StringType::Printable, value)
    }

    pub fn ia5_string<S: Into<String>>(value: S) -> Self {
        Self::string(StringType::Ia5, value)
    }

    pub fn numeric_string<S: Into<String>>(value: S) -> Self {
        Self::string(StringType::Numeric, value)
    }

    pub fn teletex_string<S: Into<String>>(value: S) -> Self {
        Self::string(StringType::Teletex, value)
    }

    pub fn videotex_string<S: Into<String>>(value: S) -> Self {
        Self::string(StringType::Videotex, value)
    }

    pub fn graphic_string<S: Into<String>>(value: S) -> Self {
        Self::string(StringType::Graphic, value)
    }

    pub fn visible_string<S: Into<String>>(value: S) -> Self {
        Self::string(StringType::Visible, value)
    }

    pub fn general_string<S: Into<String>>(value: S) -> Self {
        Self::string(StringType::General, value)
    }

    pub fn universal_string<S: Into<String>>(value: S) -> Self {
        Self::string(StringType::Universal, value)
    }

    pub fn character_string<S: Into<String>>(value: S) -> Self {
        Self::string(StringType::Character, value)
    }

    pub fn bmp_string<S: Into<String>>(value: S) -> Self {
        Self::string(StringType::Bmp, value)
    }

    pub fn utc_time(time: TimeValue) -> Self {
        Self::universal(Kind::UtcTime(time), false)
    }

    pub fn generalized_time(time: TimeValue) -> Self {
        Self::universal(Kind::GeneralizedTime(time), false)
    }

    pub(crate) fn from_parts(kind: Kind, class: TagClass, number: u32, constructed: bool) -> Self {
        Self {
            kind,
            class,
            number,
            constructed,
            trailing: None,
        }
    }

    /// Re-tag this value, e.g. for implicit tagging within a protocol message.
    pub fn with_tag(mut self, class: TagClass, number: u32) -> Self {
        self.class = class;
        self.number = number;
        self
    }

    /// Override the constructed flag. The encoder validates the flag against the type: a
    /// structurally primitive type can never be constructed and DER additionally forbids it for
    /// the string types.
    pub fn with_constructed(mut self, constructed: bool) -> Self {
        self.constructed = constructed;
        self
    }

    pub(crate) fn set_trailing(&mut self, trailing: Option<Vec<u8>>) {
        self.trailing = trailing;
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn into_kind(self) -> Kind {
        self.kind
    }

    pub fn tag_class(&self) -> TagClass {
        self.class
    }

    pub fn tag_number(&self) -> u32 {
        self.number
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// The input bytes that followed the first complete TLV; only ever set on the root value
    /// returned by a decode.
    pub fn trailing_data(&self) -> Option<&[u8]> {
        self.trailing.as_deref()
    }

    /// The children of a SEQUENCE or SET, `None` for every other payload.
    pub fn children(&self) -> Option<&[Value]> {
        match &self.kind {
            Kind::Sequence(children) | Kind::Set(children) => Some(children),
            _ => None,
        }
    }
}

// --- Tests ----------------------------------------------------------------------------------------------------------
