//! Shared byte fixtures for the codec scenario tests.

/// Turn a spaced hex string (optionally with `|` separators between tag, length and value) into
/// bytes.
pub(crate) fn hex_bytes(text: &str) -> Vec<u8> {
    hex::decode(text.replace(' ', "").replace('|', "")).unwrap()
}

/// An LDAP-flavoured message exercising the default APPLICATION tag map:
///
/// ```text
/// SEQUENCE {                          -- LDAPMessage
///   INTEGER 1,                        -- messageID
///   [APPLICATION 0] SEQUENCE {        -- bindRequest, mapped to SEQUENCE
///     INTEGER 3,                      -- version
///     OCTET STRING "cn=admin",        -- name
///     [CONTEXT 0] "secret"            -- simple authentication, unmapped
///   }
/// }
/// ```
pub(crate) fn ldap_bind_request() -> Vec<u8> {
    hex_bytes(
        "30 1A \
         02 01 01 \
         60 15 \
         02 01 03 \
         04 08 63 6E 3D 61 64 6D 69 6E \
         80 06 73 65 63 72 65 74",
    )
}
