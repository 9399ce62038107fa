//! Encode an ASN.1 value tree into BER or DER bytes.

use crate::codec::{CodecOptions, EncodingRules};
use crate::error::{Error, Result};
use crate::types::{DateTimeFormat, Kind, TimeValue, TimeZoneFormat, UniversalType, Value};

use chrono::{Datelike, FixedOffset, Timelike};

// --- Public interface -----------------------------------------------------------------------------------------------

pub(crate) fn to_vec(value: &Value, rules: EncodingRules, options: &CodecOptions) -> Result<Vec<u8>> {
    let serializer = Serializer { rules, options };
    let mut dst = Vec::new();
    serializer.write_value(value, &mut dst)?;
    Ok(dst)
}

// --- Private implementation details ---------------------------------------------------------------------------------

struct Serializer<'a> {
    rules: EncodingRules,
    options: &'a CodecOptions,
}

impl<'a> Serializer<'a> {
    fn write_value(&self, value: &Value, dst: &mut Vec<u8>) -> Result<()> {
        // X.690 8.9.1 / 8.12.1: SEQUENCE and SET encodings "shall be constructed"; the flag on the
        // value is not consulted for them.
        let constructed = match value.kind() {
            Kind::Sequence(_) | Kind::Set(_) => true,
            _ => value.is_constructed(),
        };
        self.check_form(value, constructed)?;

        let payload = self.payload(value)?;
        write_identifier(value.tag_class().bits(), value.tag_number(), constructed, dst);
        write_length(payload.len(), dst);
        dst.extend_from_slice(&payload);
        Ok(())
    }

    fn check_form(&self, value: &Value, constructed: bool) -> Result<()> {
        if !constructed {
            return Ok(());
        }
        if let Some(universal) = value.kind().universal_type() {
            if universal.is_structurally_primitive() {
                return Err(Error::encoder(format!("{} must use a primitive encoding", universal)));
            }
            if self.options.is_primitive_only(universal) {
                return Err(Error::encoder(format!(
                    "The encoding rules require {} to be primitive",
                    universal
                )));
            }
        }
        Ok(())
    }

    fn payload(&self, value: &Value) -> Result<Vec<u8>> {
        match value.kind() {
            // X.690 8.2.2: FALSE is a zero octet, TRUE is "any non-zero value". 11.1 restricts
            // the canonical TRUE to 0xFF, which is what we always emit.
            Kind::Boolean(v) => Ok(vec![if *v { 0xFF } else { 0x00 }]),
            Kind::Integer(v) | Kind::Enumerated(v) => Ok(encode_integer(*v)),
            Kind::BitString(bits) => self.encode_bit_string(bits),
            Kind::OctetString(bytes) => Ok(bytes.clone()),
            Kind::Null => Ok(Vec::new()),
            Kind::Oid(oid) => encode_oid(oid),
            Kind::RelativeOid(oid) => encode_relative_oid(oid),
            Kind::Sequence(children) => self.encode_children(children, false),
            Kind::Set(children) => self.encode_children(children, self.rules == EncodingRules::Der),
            Kind::CharacterString { value, .. } => Ok(value.as_bytes().to_vec()),
            Kind::UtcTime(time) => self.encode_utc_time(time),
            Kind::GeneralizedTime(time) => self.encode_generalized_time(time),
            // An incomplete value re-emits the content bytes it was decoded with.
            Kind::Incomplete(bytes) => Ok(bytes.clone()),
        }
    }

    fn encode_children(&self, children: &[Value], canonical: bool) -> Result<Vec<u8>> {
        if !canonical {
            let mut dst = Vec::new();
            for child in children {
                self.write_value(child, &mut dst)?;
            }
            return Ok(dst);
        }

        // DER SET ordering: members sort by tag class (UNIVERSAL, APPLICATION, CONTEXT, PRIVATE)
        // then ascending tag number; members that tie on both (SET OF) sort by their complete
        // encoded octet strings per X.690 11.6. The tuple sort is stable, so equal encodings keep
        // construction order.
        let mut parts: Vec<(u8, u32, Vec<u8>)> = Vec::with_capacity(children.len());
        for child in children {
            let mut bytes = Vec::new();
            self.write_value(child, &mut bytes)?;
            parts.push((child.tag_class().rank(), child.tag_number(), bytes));
        }
        parts.sort();

        let mut dst = Vec::new();
        for (_, _, bytes) in parts {
            dst.extend_from_slice(&bytes);
        }
        Ok(dst)
    }

    // X.690 8.6.2: the initial octet gives the number of unused bits in the final octet, zero to
    // seven; 8.6.2.3: an empty bit string is the single initial octet 0x00.
    fn encode_bit_string(&self, bits: &str) -> Result<Vec<u8>> {
        if bits.chars().any(|c| c != '0' && c != '1') {
            return Err(Error::encoder("The bit string may only contain the characters 0 and 1"));
        }
        let padding = self.options.bitstring_padding();
        if padding != '0' && padding != '1' {
            return Err(Error::encoder("The bit string padding must be the character 0 or 1"));
        }

        let unused = (8 - bits.len() % 8) % 8;
        let mut padded = String::with_capacity(bits.len() + unused);
        padded.push_str(bits);
        for _ in 0..unused {
            padded.push(padding);
        }

        let mut dst = Vec::with_capacity(1 + padded.len() / 8);
        dst.push(unused as u8);
        for chunk in padded.as_bytes().chunks(8) {
            let mut octet = 0u8;
            for &bit in chunk {
                octet = (octet << 1) | (bit - b'0');
            }
            dst.push(octet);
        }
        Ok(dst)
    }

    fn encode_utc_time(&self, time: &TimeValue) -> Result<Vec<u8>> {
        match time.datetime_format() {
            DateTimeFormat::Minutes | DateTimeFormat::Seconds => {}
            _ => return Err(Error::encoder("UTCTime only supports minute or second precision")),
        }
        if time.timezone_format() == TimeZoneFormat::Local {
            return Err(Error::encoder("UTCTime must include a timezone"));
        }
        let year = time.datetime().year();
        if !(1950..=2049).contains(&year) {
            return Err(Error::encoder("UTCTime can only represent the years 1950 through 2049"));
        }
        if self.rules == EncodingRules::Der {
            self.check_der_time(time)?;
        }

        let dt = time.datetime();
        let mut text = format!(
            "{:02}{:02}{:02}{:02}{:02}",
            year % 100,
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute()
        );
        if time.datetime_format() == DateTimeFormat::Seconds {
            text.push_str(&format!("{:02}", dt.second()));
        }
        push_zone(&mut text, time);
        Ok(text.into_bytes())
    }

    fn encode_generalized_time(&self, time: &TimeValue) -> Result<Vec<u8>> {
        let year = time.datetime().year();
        if !(0..=9999).contains(&year) {
            return Err(Error::encoder(
                "GeneralizedTime can only represent the years 0000 through 9999",
            ));
        }
        if self.rules == EncodingRules::Der {
            self.check_der_time(time)?;
        }

        let dt = time.datetime();
        let mut text = format!("{:04}{:02}{:02}{:02}", year, dt.month(), dt.day(), dt.hour());
        match time.datetime_format() {
            DateTimeFormat::Hours => {}
            DateTimeFormat::Minutes => text.push_str(&format!("{:02}", dt.minute())),
            DateTimeFormat::Seconds => text.push_str(&format!("{:02}{:02}", dt.minute(), dt.second())),
            DateTimeFormat::Fractions => {
                text.push_str(&format!("{:02}{:02}", dt.minute(), dt.second()));
                let fraction = format!("{:03}", time.fraction_millis());
                let fraction = fraction.trim_end_matches('0');
                if !fraction.is_empty() {
                    text.push('.');
                    text.push_str(fraction);
                }
            }
        }
        push_zone(&mut text, time);
        Ok(text.into_bytes())
    }

    fn check_der_time(&self, time: &TimeValue) -> Result<()> {
        if time.timezone_format() != TimeZoneFormat::Utc {
            return Err(Error::encoder("DER requires times to be in UTC"));
        }
        match time.datetime_format() {
            DateTimeFormat::Seconds | DateTimeFormat::Fractions => Ok(()),
            _ => Err(Error::encoder("DER requires times to include seconds")),
        }
    }
}

fn push_zone(text: &mut String, time: &TimeValue) {
    match time.timezone_format() {
        TimeZoneFormat::Utc => text.push('Z'),
        TimeZoneFormat::Local => {}
        TimeZoneFormat::Diff => text.push_str(&format_offset(time.offset())),
    }
}

fn format_offset(offset: Option<FixedOffset>) -> String {
    let seconds = offset.map(|o| o.local_minus_utc()).unwrap_or(0);
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.abs();
    format!("{}{:02}{:02}", sign, abs / 3600, (abs % 3600) / 60)
}

// --- Identifier and length octets -----------------------------------------------------------------------------------

// X.690 8.1.2.4: tag numbers 31 and up put 0b11111 in the low five bits of the leading octet and
// follow it with base-128 octets, most significant first, bit 8 set on all but the last.
fn write_identifier(class_bits: u8, number: u32, constructed: bool, dst: &mut Vec<u8>) {
    let leading = class_bits | if constructed { 0x20 } else { 0x00 };
    if number <= 30 {
        dst.push(leading | number as u8);
    } else {
        dst.push(leading | 0x1F);
        write_base128(number as u64, dst);
    }
}

// X.690 8.1.3.5: in the long form bit 8 of the initial octet is one and bits 7 to 1 give the
// number of subsequent length octets; the value 0xFF is reserved.
fn write_length(length: usize, dst: &mut Vec<u8>) {
    if length < 128 {
        dst.push(length as u8);
        return;
    }
    let bytes = (length as u64).to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count();
    dst.push(0x80 | (bytes.len() - skip) as u8);
    dst.extend_from_slice(&bytes[skip..]);
}

fn write_base128(value: u64, dst: &mut Vec<u8>) {
    let mut groups = [0u8; 10];
    let mut count = 0;
    let mut value = value;
    loop {
        groups[count] = (value & 0x7F) as u8;
        count += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..count).rev() {
        dst.push(if i == 0 { groups[i] } else { groups[i] | 0x80 });
    }
}

// --- Per-type payloads ----------------------------------------------------------------------------------------------

// X.690 8.3.2: "the bits of the first octet and bit 8 of the second octet shall not all be ones
// and shall not all be zero", i.e. the two's complement image is trimmed to its shortest form.
// A trim loop has no corner cases; -128 falls out as the single octet 0x80.
fn encode_integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7
        && ((bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0))
    {
        start += 1;
    }
    bytes[start..].to_vec()
}

fn parse_arcs(oid: &str) -> Result<Vec<u64>> {
    oid.split('.')
        .map(|arc| {
            arc.parse::<u64>()
                .map_err(|_| Error::encoder(format!("The OID arc {:?} is not a number", arc)))
        })
        .collect()
}

// X.690 8.19.4: the first two arcs merge into the single subidentifier 40 * arc1 + arc2, which is
// what caps arc2 at 39 for the 0 and 1 roots.
fn encode_oid(oid: &str) -> Result<Vec<u8>> {
    let arcs = parse_arcs(oid)?;
    if arcs.len() < 2 {
        return Err(Error::encoder("The OID must have at least two arcs to be encoded"));
    }
    if arcs[0] > 2 {
        return Err(Error::encoder("The first OID arc must be 0, 1 or 2"));
    }
    if arcs[0] < 2 && arcs[1] > 39 {
        return Err(Error::encoder(
            "The second OID arc must be 39 or less when the first arc is 0 or 1",
        ));
    }

    let first = arcs[0]
        .checked_mul(40)
        .and_then(|v| v.checked_add(arcs[1]))
        .ok_or_else(|| Error::encoder("The OID's first subidentifier overflows"))?;

    let mut dst = Vec::new();
    write_base128(first, &mut dst);
    for &arc in &arcs[2..] {
        write_base128(arc, &mut dst);
    }
    Ok(dst)
}

// X.690 8.20: a relative OID is the subidentifier run alone; no arcs are merged.
fn encode_relative_oid(oid: &str) -> Result<Vec<u8>> {
    let arcs = parse_arcs(oid)?;
    let mut dst = Vec::new();
    for &arc in &arcs {
        write_base128(arc, &mut dst);
    }
    Ok(dst)
}

// --- Tests ----------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    #[allow(unused_imports)]
    use pretty_assertions::{assert_eq, assert_ne};

    use super::*;

    #[test]
    fn test_encode_integer_trims_to_the_shortest_form() {
        assert_eq!(encode_integer(0), vec![0x00]);
        assert_eq!(encode_integer(1), vec![0x01]);
        assert_eq!(encode_integer(-1), vec![0xFF]);
        assert_eq!(encode_integer(127), vec![0x7F]);
        assert_eq!(encode_integer(128), vec![0x00, 0x80]);
        assert_eq!(encode_integer(-128), vec![0x80]);
        assert_eq!(encode_integer(-129), vec![0xFF, 0x7F]);
        assert_eq!(encode_integer(256), vec![0x01, 0x00]);
        assert_eq!(encode_integer(27066), vec![0x69, 0xBA]);
        assert_eq!(encode_integer(-27066), vec![0x96, 0x46]);
        assert_eq!(encode_integer(i64::MIN), vec![0x80, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            encode_integer(i64::MAX),
            vec![0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_write_length_forms() {
        let mut dst = Vec::new();
        write_length(0, &mut dst);
        write_length(127, &mut dst);
        assert_eq!(dst, vec![0x00, 0x7F]);

        let mut dst = Vec::new();
        write_length(128, &mut dst);
        assert_eq!(dst, vec![0x81, 0x80]);

        let mut dst = Vec::new();
        write_length(65536, &mut dst);
        assert_eq!(dst, vec![0x83, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_write_identifier_high_tag_numbers() {
        let mut dst = Vec::new();
        write_identifier(0x80, 30, false, &mut dst);
        assert_eq!(dst, vec![0x9E]);

        let mut dst = Vec::new();
        write_identifier(0x80, 31, false, &mut dst);
        assert_eq!(dst, vec![0x9F, 0x1F]);

        let mut dst = Vec::new();
        write_identifier(0x40, 311, true, &mut dst);
        assert_eq!(dst, vec![0x7F, 0x82, 0x37]);
    }

    #[test]
    fn test_encode_oid_merges_the_first_two_arcs() {
        assert_eq!(
            encode_oid("1.3.6.1.4.1.311.21.20").unwrap(),
            vec![0x2B, 0x06, 0x01, 0x04, 0x01, 0x82, 0x37, 0x15, 0x14]
        );
        assert_eq!(encode_oid("2.999").unwrap(), vec![0x88, 0x37]);
    }

    #[test]
    fn test_encode_oid_rejects_malformed_arc_lists() {
        assert!(encode_oid("1").is_err());
        assert!(encode_oid("3.1").is_err());
        assert!(encode_oid("1.40").is_err());
        assert!(encode_oid("0.40").is_err());
        assert!(encode_oid("1.abc").is_err());
        assert!(encode_oid("").is_err());
        assert!(encode_oid("2.40").is_ok());

        // A second arc under the 2 root is unbounded by the 39 rule but must still fit the
        // merged first subidentifier.
        assert!(encode_oid("2.18446744073709551615").is_err());
    }

    #[test]
    fn test_encode_relative_oid_keeps_every_arc() {
        assert_eq!(encode_relative_oid("8571.3.2").unwrap(), vec![0xC2, 0x7B, 0x03, 0x02]);
    }
}
