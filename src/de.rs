//! Decode BER or DER bytes into an ASN.1 value tree.

use std::io::{Cursor, Read};

use chrono::{FixedOffset, NaiveDate, NaiveDateTime};
use log::trace;

use crate::codec::{CodecOptions, EncodingRules};
use crate::error::{Error, ErrorKind, Result};
use crate::map::TagMap;
use crate::types::{DateTimeFormat, Kind, StringType, TagClass, TimeValue, TimeZoneFormat, UniversalType, Value};

// --- Public interface -----------------------------------------------------------------------------------------------

/// Read exactly one TLV from the front of `bytes` and return it as a value tree, with any input
/// bytes past the first complete TLV attached to the root value as trailing data.
pub(crate) fn from_slice(
    bytes: &[u8],
    rules: EncodingRules,
    options: &CodecOptions,
    map: &TagMap,
    overlay: Option<&TagMap>,
) -> Result<Value> {
    if bytes.is_empty() {
        return Err(Error::invalid_argument("The bytes to decode cannot be empty"));
    }

    let mut parser = Parser {
        src: Cursor::new(bytes),
        rules,
        options,
        map,
        overlay,
        root: true,
    };
    let mut value = parser.read_value()?;

    let consumed = parser.src.position() as usize;
    if consumed < bytes.len() {
        value.set_trailing(Some(bytes[consumed..].to_vec()));
    }
    Ok(value)
}

/// Re-parse the raw payload of an [Kind::Incomplete] value as the given universal type, keeping
/// the original tag class, tag number and constructed flag.
pub(crate) fn complete(
    value: &Value,
    universal: UniversalType,
    rules: EncodingRules,
    options: &CodecOptions,
    map: &TagMap,
    overlay: Option<&TagMap>,
) -> Result<Value> {
    let payload = match value.kind() {
        Kind::Incomplete(bytes) => bytes.as_slice(),
        _ => return Err(Error::invalid_argument("Only an incomplete value can be completed")),
    };

    let mut parser = Parser {
        src: Cursor::new(payload),
        rules,
        options,
        map,
        overlay,
        root: false,
    };
    let kind = parser.parse_payload(universal, payload, value.is_constructed())?;
    Ok(Value::from_parts(
        kind,
        value.tag_class(),
        value.tag_number(),
        value.is_constructed(),
    ))
}

// --- Private implementation details ---------------------------------------------------------------------------------

struct Parser<'a, 'c> {
    src: Cursor<&'a [u8]>,
    rules: EncodingRules,
    options: &'c CodecOptions,
    map: &'c TagMap,
    overlay: Option<&'c TagMap>,

    // A shortfall at the root is a partial PDU (the caller should read more bytes and retry);
    // the same shortfall inside an already-delimited constructed value is malformed data.
    root: bool,
}

impl<'a, 'c> Parser<'a, 'c> {
    fn read_value(&mut self) -> Result<Value> {
        let (class, number, constructed) = self.read_identifier()?;
        trace!(
            "Read identifier octets: class={} number={} constructed={}",
            class,
            number,
            constructed
        );
        let length = self.read_length()?;
        let payload = self.read_slice(length, class, number)?;

        let kind = if class == TagClass::Universal {
            let universal = UniversalType::from_number(number).ok_or_else(|| {
                pinpoint!(
                    ErrorKind::Encoder(format!("The universal tag number {} is not recognized", number)),
                    &self.src,
                    class,
                    number
                )
            })?;
            self.parse_payload(universal, payload, constructed)?
        } else {
            match self.map.resolve(self.overlay, class, number) {
                Some(universal) => self.parse_payload(universal, payload, constructed)?,
                None => Kind::Incomplete(payload.to_vec()),
            }
        };

        Ok(Value::from_parts(kind, class, number, constructed))
    }

    // X.690 8.1.2: bits 8-7 of the leading octet are the class, bit 6 the constructed flag, bits
    // 5-1 the tag number unless all ones, in which case the number follows base-128 with the
    // continuation bit in bit 8.
    fn read_identifier(&mut self) -> Result<(TagClass, u32, bool)> {
        let leading = self.read_octet("Not enough data to decode the tag")?;
        let class = TagClass::from_identifier(leading);
        let constructed = leading & 0x20 != 0;
        let low_bits = leading & 0x1F;

        if low_bits != 0x1F {
            return Ok((class, low_bits as u32, constructed));
        }

        let mut number: u64 = 0;
        loop {
            let octet = self.read_octet("Not enough data to decode the high tag number")?;
            number = (number << 7) | (octet & 0x7F) as u64;
            if number > u32::MAX as u64 {
                return Err(pinpoint!(
                    ErrorKind::Encoder("The tag number is too large to decode".into()),
                    &self.src,
                    class,
                    number as u32
                ));
            }
            if octet & 0x80 == 0 {
                break;
            }
        }
        Ok((class, number as u32, constructed))
    }

    // X.690 8.1.3: short form lengths fit bits 7-1 of a single octet; the long form initial octet
    // sets bit 8 and counts the subsequent octets. 0x80 alone is the indefinite form and 0xFF is
    // reserved for future use.
    fn read_length(&mut self) -> Result<usize> {
        let first = self.read_octet("Not enough data to decode the length")?;

        if first & 0x80 == 0 {
            return Ok(first as usize);
        }
        if first == 0x80 {
            return Err(pinpoint!(
                ErrorKind::Encoder("Indefinite length encoding is not supported".into()),
                &self.src
            ));
        }

        let count = (first & 0x7F) as usize;
        if count == 0x7F {
            return Err(pinpoint!(
                ErrorKind::Encoder("The long form length value 0x7F is reserved for future use".into()),
                &self.src
            ));
        }
        if count > std::mem::size_of::<usize>() {
            return Err(pinpoint!(
                ErrorKind::Encoder("The length is too large to decode".into()),
                &self.src
            ));
        }

        let mut octets = [0u8; std::mem::size_of::<usize>()];
        if self.src.read_exact(&mut octets[..count]).is_err() {
            return Err(self.insufficient("Not enough data to decode the length"));
        }

        let mut length = 0usize;
        for &octet in &octets[..count] {
            length = (length << 8) | octet as usize;
        }

        if self.rules == EncodingRules::Der && (length < 128 || octets[0] == 0) {
            return Err(pinpoint!(
                ErrorKind::Encoder("DER must be encoded using the shortest possible length form".into()),
                &self.src
            ));
        }
        trace!("Read length octets: length={}", length);
        Ok(length)
    }

    fn read_octet(&mut self, shortfall: &str) -> Result<u8> {
        let mut buf = [0u8; 1];
        if self.src.read_exact(&mut buf).is_err() {
            return Err(self.insufficient(shortfall));
        }
        Ok(buf[0])
    }

    fn read_slice(&mut self, length: usize, class: TagClass, number: u32) -> Result<&'a [u8]> {
        let start = self.src.position() as usize;
        let data = *self.src.get_ref();
        if length > data.len() - start {
            return Err(Error::pinpoint_with_tag(
                self.shortfall_kind("Not enough data to decode the value"),
                &self.src,
                class,
                number,
            ));
        }
        self.src.set_position((start + length) as u64);
        Ok(&data[start..start + length])
    }

    fn insufficient(&self, msg: &str) -> Error {
        pinpoint!(self.shortfall_kind(msg), &self.src)
    }

    fn shortfall_kind(&self, msg: &str) -> ErrorKind {
        if self.root {
            ErrorKind::PartialPdu(msg.to_string())
        } else {
            ErrorKind::Encoder(msg.to_string())
        }
    }

    fn parse_payload(&mut self, universal: UniversalType, payload: &'a [u8], constructed: bool) -> Result<Kind> {
        self.check_form(universal, constructed)?;

        if payload.is_empty()
            && matches!(
                universal,
                UniversalType::Boolean
                    | UniversalType::Integer
                    | UniversalType::Enumerated
                    | UniversalType::Oid
                    | UniversalType::RelativeOid
                    | UniversalType::UtcTime
                    | UniversalType::GeneralizedTime
            )
        {
            return Err(self.encoder(format!("A zero length {} is not allowed", universal)));
        }

        match universal {
            UniversalType::Boolean => {
                if payload.len() != 1 {
                    return Err(self.encoder(format!(
                        "A boolean must be exactly one content byte, but got {}",
                        payload.len()
                    )));
                }
                Ok(Kind::Boolean(payload[0] != 0x00))
            }
            UniversalType::Integer => Ok(Kind::Integer(self.parse_integer(payload)?)),
            UniversalType::Enumerated => Ok(Kind::Enumerated(self.parse_integer(payload)?)),
            UniversalType::BitString => self.parse_bit_string(payload),
            UniversalType::OctetString => Ok(Kind::OctetString(payload.to_vec())),
            UniversalType::Null => {
                if !payload.is_empty() {
                    return Err(self.encoder("A null must not carry any content bytes"));
                }
                Ok(Kind::Null)
            }
            UniversalType::Oid => Ok(Kind::Oid(self.parse_oid(payload)?)),
            UniversalType::RelativeOid => Ok(Kind::RelativeOid(self.parse_relative_oid(payload)?)),
            UniversalType::Sequence => Ok(Kind::Sequence(self.parse_children(payload)?)),
            UniversalType::Set => Ok(Kind::Set(self.parse_children(payload)?)),
            UniversalType::UtcTime => Ok(Kind::UtcTime(self.parse_utc_time(payload)?)),
            UniversalType::GeneralizedTime => Ok(Kind::GeneralizedTime(self.parse_generalized_time(payload)?)),
            _ => {
                // What remains is the twelve character-restricted string variants.
                let string_type = StringType::from_universal(universal)
                    .ok_or_else(|| self.encoder(format!("{} has no payload interpretation", universal)))?;
                let value = String::from_utf8(payload.to_vec())
                    .map_err(|_| self.encoder(format!("The {} payload is not valid UTF-8", universal)))?;
                Ok(Kind::CharacterString { string_type, value })
            }
        }
    }

    fn check_form(&self, universal: UniversalType, constructed: bool) -> Result<()> {
        if constructed {
            if universal.is_structurally_primitive() {
                return Err(self.encoder(format!("{} must use a primitive encoding", universal)));
            }
            if self.options.is_primitive_only(universal) {
                return Err(self.encoder(format!("The encoding rules require {} to be primitive", universal)));
            }
        } else if matches!(universal, UniversalType::Sequence | UniversalType::Set) {
            return Err(self.encoder(format!("{} must use a constructed encoding", universal)));
        }
        Ok(())
    }

    fn parse_children(&self, payload: &'a [u8]) -> Result<Vec<Value>> {
        let mut parser = Parser {
            src: Cursor::new(payload),
            rules: self.rules,
            options: self.options,
            map: self.map,
            overlay: self.overlay,
            root: false,
        };

        let mut children = Vec::new();
        while (parser.src.position() as usize) < payload.len() {
            children.push(parser.read_value()?);
        }
        Ok(children)
    }

    // Big-endian two's complement, sign extended from the first content octet.
    fn parse_integer(&self, payload: &[u8]) -> Result<i64> {
        if payload.len() > 8 {
            return Err(self.encoder("The integer is too large to decode"));
        }
        let mut value: i64 = if payload[0] & 0x80 != 0 { -1 } else { 0 };
        for &octet in payload {
            value = (value << 8) | octet as i64;
        }
        Ok(value)
    }

    fn parse_bit_string(&self, payload: &[u8]) -> Result<Kind> {
        let unused = match payload.first() {
            Some(&unused) => unused,
            None => return Err(self.encoder("The bit string is missing its unused bits octet")),
        };
        if unused > 7 {
            return Err(self.encoder("The unused bits of a bit string must be between 0 and 7"));
        }
        let octets = &payload[1..];
        if octets.is_empty() && unused != 0 {
            return Err(self.encoder("An empty bit string must have no unused bits"));
        }
        // DER 11.2.1: the unused padding bits must all be zero. The check is on the low `unused`
        // bits of the final octet.
        if self.rules == EncodingRules::Der && unused > 0 {
            if let Some(&last) = octets.last() {
                if last & ((1u8 << unused) - 1) != 0 {
                    return Err(self.encoder(format!(
                        "The last {} unused bits of the bit string must be 0",
                        unused
                    )));
                }
            }
        }

        let mut bits = String::with_capacity(octets.len() * 8);
        for &octet in octets {
            for shift in (0..8).rev() {
                bits.push(if octet >> shift & 1 == 1 { '1' } else { '0' });
            }
        }
        bits.truncate(bits.len() - unused as usize);
        Ok(Kind::BitString(bits))
    }

    fn parse_subidentifiers(&self, payload: &[u8]) -> Result<Vec<u64>> {
        let mut arcs = Vec::new();
        let mut arc: u64 = 0;
        let mut mid_arc = false;
        for &octet in payload {
            arc = arc
                .checked_mul(128)
                .and_then(|v| v.checked_add((octet & 0x7F) as u64))
                .ok_or_else(|| self.encoder("The OID arc is too large to decode"))?;
            if octet & 0x80 == 0 {
                arcs.push(arc);
                arc = 0;
                mid_arc = false;
            } else {
                mid_arc = true;
            }
        }
        if mid_arc {
            return Err(self.encoder("The OID ends with an unterminated arc"));
        }
        Ok(arcs)
    }

    // X.690 8.19.4 in reverse: the first subidentifier folds the first two arcs together, so
    // values below 40 belong to root 0, below 80 to root 1 and everything else to root 2.
    fn parse_oid(&self, payload: &[u8]) -> Result<String> {
        let arcs = self.parse_subidentifiers(payload)?;
        let first = arcs[0];
        let (root, second) = if first < 40 {
            (0, first)
        } else if first < 80 {
            (1, first - 40)
        } else {
            (2, first - 80)
        };

        let mut oid = format!("{}.{}", root, second);
        for arc in &arcs[1..] {
            oid.push_str(&format!(".{}", arc));
        }
        Ok(oid)
    }

    fn parse_relative_oid(&self, payload: &[u8]) -> Result<String> {
        let arcs = self.parse_subidentifiers(payload)?;
        let rendered: Vec<String> = arcs.iter().map(|arc| arc.to_string()).collect();
        Ok(rendered.join("."))
    }

    // --- Time lexing ---

    fn parse_generalized_time(&self, payload: &[u8]) -> Result<TimeValue> {
        let text = std::str::from_utf8(payload).map_err(|_| self.encoder("The time is not valid ASCII"))?;
        let parts = self.lex_time(text)?;

        // X.680 46: GeneralizedTime is YYYYMMDDHH with optional minutes, optional seconds and an
        // optional fraction of the finest field present; we accept fractions of seconds only.
        let datetime_format = match (parts.digits.len(), &parts.fraction) {
            (10, None) => DateTimeFormat::Hours,
            (12, None) => DateTimeFormat::Minutes,
            (14, None) => DateTimeFormat::Seconds,
            (14, Some(_)) => DateTimeFormat::Fractions,
            (10, Some(_)) | (12, Some(_)) => {
                return Err(self.encoder("A fractional time requires seconds to be specified"))
            }
            _ => return Err(self.encoder(format!("The datetime {:?} has an invalid format", text))),
        };

        let year: i32 = parts.digits[0..4]
            .parse()
            .map_err(|_| self.encoder("The time year is not a number"))?;
        let month = self.two_digits(&parts.digits[4..6])?;
        let day = self.two_digits(&parts.digits[6..8])?;
        let hour = self.hour(&parts.digits[8..10])?;
        let minute = if parts.digits.len() >= 12 {
            self.two_digits(&parts.digits[10..12])?
        } else {
            0
        };
        let second = if parts.digits.len() >= 14 {
            self.two_digits(&parts.digits[12..14])?
        } else {
            0
        };
        let millis = self.fraction_millis(parts.fraction)?;

        let datetime_format = if datetime_format == DateTimeFormat::Fractions && millis == 0 {
            DateTimeFormat::Seconds
        } else {
            datetime_format
        };

        let time = self.build_time(text, year, month, day, hour, minute, second, millis, datetime_format, parts.zone)?;
        if self.rules == EncodingRules::Der {
            self.check_der_time(&time)?;
        }
        Ok(time)
    }

    fn parse_utc_time(&self, payload: &[u8]) -> Result<TimeValue> {
        let text = std::str::from_utf8(payload).map_err(|_| self.encoder("The time is not valid ASCII"))?;
        let parts = self.lex_time(text)?;

        if parts.fraction.is_some() {
            return Err(self.encoder("UTCTime does not support fractional seconds"));
        }
        // X.680 47: UTCTime is YYMMDDHHMM with optional seconds and a mandatory zone.
        let datetime_format = match parts.digits.len() {
            10 => DateTimeFormat::Minutes,
            12 => DateTimeFormat::Seconds,
            _ => return Err(self.encoder(format!("The datetime {:?} has an invalid format", text))),
        };
        if parts.zone == ZonePart::Local {
            return Err(self.encoder("UTCTime must include a timezone"));
        }

        let two_digit_year: i32 = parts.digits[0..2]
            .parse()
            .map_err(|_| self.encoder("The time year is not a number"))?;
        // RFC 5280 4.1.2.5.1 windowing: 00-49 are the 2000s, 50-99 the 1900s.
        let year = if two_digit_year < 50 {
            2000 + two_digit_year
        } else {
            1900 + two_digit_year
        };
        let month = self.two_digits(&parts.digits[2..4])?;
        let day = self.two_digits(&parts.digits[4..6])?;
        let hour = self.hour(&parts.digits[6..8])?;
        let minute = self.two_digits(&parts.digits[8..10])?;
        let second = if parts.digits.len() == 12 {
            self.two_digits(&parts.digits[10..12])?
        } else {
            0
        };

        let time = self.build_time(text, year, month, day, hour, minute, second, 0, datetime_format, parts.zone)?;
        if self.rules == EncodingRules::Der {
            self.check_der_time(&time)?;
        }
        Ok(time)
    }

    fn lex_time<'t>(&self, text: &'t str) -> Result<TimeParts<'t>> {
        let digit_end = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or_else(|| text.len());
        let digits = &text[..digit_end];
        let mut rest = &text[digit_end..];

        let mut fraction = None;
        if rest.starts_with('.') || rest.starts_with(',') {
            rest = &rest[1..];
            let fraction_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or_else(|| rest.len());
            if fraction_end == 0 {
                return Err(self.encoder("The time fraction is missing its digits"));
            }
            fraction = Some(&rest[..fraction_end]);
            rest = &rest[fraction_end..];
        }

        let zone = match rest {
            "" => ZonePart::Local,
            "Z" => ZonePart::Utc,
            _ if rest.starts_with('+') || rest.starts_with('-') => {
                let sign: i32 = if rest.starts_with('-') { -1 } else { 1 };
                let digits = &rest[1..];
                if !(digits.len() == 2 || digits.len() == 4) || digits.bytes().any(|b| !b.is_ascii_digit()) {
                    return Err(self.encoder(format!("The timezone differential {:?} is invalid", rest)));
                }
                let hours = self.two_digits(&digits[0..2])?;
                let minutes = if digits.len() == 4 { self.two_digits(&digits[2..4])? } else { 0 };
                if hours > 23 || minutes > 59 {
                    return Err(self.encoder(format!("The timezone differential {:?} is out of range", rest)));
                }
                ZonePart::Diff(sign * (hours as i32 * 3600 + minutes as i32 * 60))
            }
            _ => return Err(self.encoder(format!("The time {:?} has an invalid timezone", text))),
        };

        Ok(TimeParts { digits, fraction, zone })
    }

    #[allow(clippy::too_many_arguments)]
    fn build_time(
        &self,
        text: &str,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        millis: u32,
        datetime_format: DateTimeFormat,
        zone: ZonePart,
    ) -> Result<TimeValue> {
        let datetime: Option<NaiveDateTime> = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_milli_opt(hour, minute, second, millis));
        let datetime = match datetime {
            Some(datetime) => datetime,
            None => return Err(self.encoder(format!("The datetime {:?} is not a valid calendar time", text))),
        };

        let (timezone_format, offset) = match zone {
            ZonePart::Utc => (TimeZoneFormat::Utc, None),
            ZonePart::Local => (TimeZoneFormat::Local, None),
            ZonePart::Diff(seconds) => {
                let offset = FixedOffset::east_opt(seconds)
                    .ok_or_else(|| self.encoder("The timezone differential is out of range"))?;
                (TimeZoneFormat::Diff, Some(offset))
            }
        };

        Ok(TimeValue {
            datetime,
            datetime_format,
            timezone_format,
            offset,
        })
    }

    fn check_der_time(&self, time: &TimeValue) -> Result<()> {
        if time.timezone_format() != TimeZoneFormat::Utc {
            return Err(self.encoder("DER requires times to be in UTC"));
        }
        match time.datetime_format() {
            DateTimeFormat::Seconds | DateTimeFormat::Fractions => Ok(()),
            _ => Err(self.encoder("DER requires times to include seconds")),
        }
    }

    fn two_digits(&self, text: &str) -> Result<u32> {
        text.parse()
            .map_err(|_| self.encoder(format!("The time field {:?} is not a number", text)))
    }

    fn hour(&self, text: &str) -> Result<u32> {
        if text == "24" {
            return Err(self.encoder("Midnight must only be specified by 00, but got 24."));
        }
        self.two_digits(text)
    }

    fn fraction_millis(&self, fraction: Option<&str>) -> Result<u32> {
        let digits = match fraction {
            Some(digits) => digits,
            None => return Ok(0),
        };
        if digits.len() > 3 {
            return Err(self.encoder("Fractional seconds beyond milliseconds are not supported"));
        }
        let parsed: u32 = digits
            .parse()
            .map_err(|_| self.encoder("The time fraction is not a number"))?;
        Ok(parsed * 10u32.pow(3 - digits.len() as u32))
    }

    fn encoder<S: Into<String>>(&self, msg: S) -> Error {
        pinpoint!(ErrorKind::Encoder(msg.into()), &self.src)
    }
}

#[derive(Debug, PartialEq)]
enum ZonePart {
    Utc,
    Local,
    Diff(i32),
}

struct TimeParts<'t> {
    digits: &'t str,
    fraction: Option<&'t str>,
    zone: ZonePart,
}

// --- Tests ----------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    #[allow(unused_imports)]
    use pretty_assertions::{assert_eq, assert_ne};

    use crate::codec::Codec;

    use super::*;

    fn parser<'a>(bytes: &'a [u8], codec: &'a Codec) -> Parser<'a, 'a> {
        Parser {
            src: Cursor::new(bytes),
            rules: codec.rules(),
            options: codec.options(),
            map: codec.tag_map(),
            overlay: None,
            root: false,
        }
    }

    #[test]
    fn test_parse_integer_sign_extends() {
        let codec = Codec::ber();
        let p = parser(&[], &codec);
        assert_eq!(p.parse_integer(&[0x00]).unwrap(), 0);
        assert_eq!(p.parse_integer(&[0x7F]).unwrap(), 127);
        assert_eq!(p.parse_integer(&[0x80]).unwrap(), -128);
        assert_eq!(p.parse_integer(&[0xFF]).unwrap(), -1);
        assert_eq!(p.parse_integer(&[0x00, 0x80]).unwrap(), 128);
        assert_eq!(p.parse_integer(&[0x96, 0x46]).unwrap(), -27066);
        assert_eq!(p.parse_integer(&[0x01; 9]).is_err(), true);
    }

    #[test]
    fn test_parse_oid_splits_the_first_subidentifier() {
        let codec = Codec::ber();
        let p = parser(&[], &codec);
        assert_eq!(p.parse_oid(&[0x2A]).unwrap(), "1.2");
        assert_eq!(p.parse_oid(&[0x27]).unwrap(), "0.39");
        assert_eq!(p.parse_oid(&[0x4F]).unwrap(), "1.39");
        assert_eq!(p.parse_oid(&[0x88, 0x37]).unwrap(), "2.999");
    }

    #[test]
    fn test_parse_subidentifiers_rejects_unterminated_arcs() {
        let codec = Codec::ber();
        let p = parser(&[], &codec);
        assert!(p.parse_subidentifiers(&[0x2B, 0x86]).is_err());
    }

    #[test]
    fn test_lex_time_zones() {
        let codec = Codec::ber();
        let p = parser(&[], &codec);

        assert_eq!(p.lex_time("2018Z").unwrap().zone, ZonePart::Utc);
        assert_eq!(p.lex_time("2018").unwrap().zone, ZonePart::Local);
        assert_eq!(p.lex_time("2018+0230").unwrap().zone, ZonePart::Diff(2 * 3600 + 30 * 60));
        assert_eq!(p.lex_time("2018-05").unwrap().zone, ZonePart::Diff(-5 * 3600));
        assert!(p.lex_time("2018Q").is_err());
        assert!(p.lex_time("2018+123").is_err());
        assert!(p.lex_time("2018.Z").is_err());
    }
}
