//! The registry that resolves non-universal tags to universal types during decode.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{TagClass, UniversalType};

/// Per-class tables mapping a tag number to the universal type its content bytes should be
/// interpreted as. Universal tags are implicit and never stored; asking the registry for a
/// universal tag answers from the fixed [UniversalType] table.
///
/// [TagMap::default] preloads the APPLICATION class with the tag assignments used by LDAP, the
/// main consumer this library grew up with. A decode consults an optional overlay map first and
/// falls back to the codec's own registry; a miss in both produces an
/// [Incomplete](crate::types::Kind::Incomplete) value.
#[derive(Clone, Debug)]
pub struct TagMap {
    application: HashMap<u32, UniversalType>,
    context: HashMap<u32, UniversalType>,
    private: HashMap<u32, UniversalType>,
}

impl Default for TagMap {
    fn default() -> Self {
        // RFC 4511 4.1.1: the LDAPMessage protocol ops. Everything structured is a SEQUENCE;
        // UnbindRequest (2) is NULL, DelRequest (10) is an OCTET STRING (the LDAPDN itself) and
        // AbandonRequest (16) is an INTEGER (the message ID).
        let mut application = HashMap::new();
        for &number in &[0, 1, 3, 4, 5, 6, 7, 8, 9, 11, 12, 13, 14, 15, 19, 23, 24, 25] {
            application.insert(number, UniversalType::Sequence);
        }
        application.insert(2, UniversalType::Null);
        application.insert(10, UniversalType::OctetString);
        application.insert(16, UniversalType::Integer);

        Self {
            application,
            context: HashMap::new(),
            private: HashMap::new(),
        }
    }
}

impl TagMap {
    /// A registry with no non-universal mappings at all.
    pub fn empty() -> Self {
        Self {
            application: HashMap::new(),
            context: HashMap::new(),
            private: HashMap::new(),
        }
    }

    /// Resolve a tag to a universal type, if the registry knows it.
    pub fn get(&self, class: TagClass, number: u32) -> Option<UniversalType> {
        match class {
            TagClass::Universal => UniversalType::from_number(number),
            TagClass::Application => self.application.get(&number).copied(),
            TagClass::Context => self.context.get(&number).copied(),
            TagClass::Private => self.private.get(&number).copied(),
        }
    }

    /// Replace the whole table for one non-universal class.
    pub fn set(&mut self, class: TagClass, map: HashMap<u32, UniversalType>) -> Result<&mut Self> {
        match class {
            TagClass::Universal => {
                return Err(Error::invalid_argument(
                    "The universal tag map is fixed and cannot be replaced",
                ))
            }
            TagClass::Application => self.application = map,
            TagClass::Context => self.context = map,
            TagClass::Private => self.private = map,
        }
        Ok(self)
    }

    /// Register a single tag in one non-universal class.
    pub fn insert(&mut self, class: TagClass, number: u32, universal: UniversalType) -> Result<&mut Self> {
        match class {
            TagClass::Universal => {
                return Err(Error::invalid_argument(
                    "The universal tag map is fixed and cannot be replaced",
                ))
            }
            TagClass::Application => {
                self.application.insert(number, universal);
            }
            TagClass::Context => {
                self.context.insert(number, universal);
            }
            TagClass::Private => {
                self.private.insert(number, universal);
            }
        }
        Ok(self)
    }

    pub(crate) fn resolve(&self, overlay: Option<&TagMap>, class: TagClass, number: u32) -> Option<UniversalType> {
        if class == TagClass::Universal {
            return UniversalType::from_number(number);
        }
        overlay
            .and_then(|map| map.get(class, number))
            .or_else(|| self.get(class, number))
    }
}

// --- Tests ----------------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    #[allow(unused_imports)]
    use pretty_assertions::{assert_eq, assert_ne};

    use super::*;

    #[test]
    fn test_default_map_carries_the_ldap_application_tags() {
        let map = TagMap::default();
        assert_eq!(map.get(TagClass::Application, 0), Some(UniversalType::Sequence)); // BindRequest
        assert_eq!(map.get(TagClass::Application, 2), Some(UniversalType::Null)); // UnbindRequest
        assert_eq!(map.get(TagClass::Application, 10), Some(UniversalType::OctetString)); // DelRequest
        assert_eq!(map.get(TagClass::Application, 16), Some(UniversalType::Integer)); // AbandonRequest
        assert_eq!(map.get(TagClass::Application, 25), Some(UniversalType::Sequence)); // IntermediateResponse
        assert_eq!(map.get(TagClass::Application, 17), None);
        assert_eq!(map.get(TagClass::Context, 0), None);
        assert_eq!(map.get(TagClass::Private, 0), None);
    }

    #[test]
    fn test_universal_lookups_answer_from_the_fixed_table() {
        let map = TagMap::empty();
        assert_eq!(map.get(TagClass::Universal, 0x02), Some(UniversalType::Integer));
        assert_eq!(map.get(TagClass::Universal, 0x09), None);
    }

    #[test]
    fn test_set_replaces_a_class_table_wholesale() {
        let mut map = TagMap::default();
        let mut replacement = HashMap::new();
        replacement.insert(7, UniversalType::Ia5String);
        map.set(TagClass::Application, replacement).unwrap();

        assert_eq!(map.get(TagClass::Application, 7), Some(UniversalType::Ia5String));
        assert_eq!(map.get(TagClass::Application, 0), None);
    }

    #[test]
    fn test_the_universal_class_is_not_writable() {
        let mut map = TagMap::default();
        assert!(map.set(TagClass::Universal, HashMap::new()).is_err());
        assert!(map.insert(TagClass::Universal, 1, UniversalType::Null).is_err());
    }

    #[test]
    fn test_overlay_wins_over_the_registry() {
        let mut registry = TagMap::empty();
        registry.insert(TagClass::Context, 0, UniversalType::Integer).unwrap();

        let mut overlay = TagMap::empty();
        overlay.insert(TagClass::Context, 0, UniversalType::OctetString).unwrap();

        assert_eq!(
            registry.resolve(Some(&overlay), TagClass::Context, 0),
            Some(UniversalType::OctetString)
        );
        assert_eq!(registry.resolve(None, TagClass::Context, 0), Some(UniversalType::Integer));
        assert_eq!(registry.resolve(Some(&overlay), TagClass::Context, 1), None);
    }
}
