//! Localized name registry.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Localized display names for one hint reference, as delivered on the wire.
///
/// Every field is optional: payloads carry whichever languages the endpoint
/// happens to serve. Unknown fields (notably the redundant `id`) are dropped
/// at decode time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub de: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub es: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub it: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pt: Option<String>,
}

/// Name-reference to payload mapping, first writer wins.
///
/// The endpoint repeats name payloads on every hint that references them;
/// only the first occurrence is kept. Conflicting payloads for an already
/// known reference are discarded, which keeps dumps stable across runs but
/// means an upstream rename is never picked up mid-collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameRegistry {
    names: IndexMap<String, HintName>,
}

impl NameRegistry {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload unless the reference is already known.
    ///
    /// Returns true when the payload was inserted.
    pub fn register(&mut self, id: &str, name: HintName) -> bool {
        if let Some(existing) = self.names.get(id) {
            if *existing != name {
                tracing::debug!(name_id = %id, "conflicting name payload discarded");
            }
            return false;
        }
        self.names.insert(id.to_string(), name);
        true
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&HintName> {
        self.names.get(id)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.names.contains_key(id)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(fr: &str) -> HintName {
        HintName {
            fr: Some(fr.to_string()),
            ..HintName::default()
        }
    }

    #[test]
    fn first_writer_wins() {
        let mut registry = NameRegistry::new();
        assert!(registry.register("41", name("Fontaine")));
        assert!(!registry.register("41", name("Statue")));
        assert_eq!(registry.get("41"), Some(&name("Fontaine")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn insertion_order_is_preserved_in_dumps() {
        let mut registry = NameRegistry::new();
        registry.register("b", name("two"));
        registry.register("a", name("one"));

        let json = serde_json::to_string(&registry).unwrap();
        let b = json.find("\"b\"").unwrap();
        let a = json.find("\"a\"").unwrap();
        assert!(b < a, "dump order must follow insertion order: {json}");
    }

    #[test]
    fn unknown_wire_fields_are_dropped() {
        let decoded: HintName =
            serde_json::from_str(r#"{"id":41,"fr":"Fontaine","en":"Fountain"}"#).unwrap();
        assert_eq!(decoded.fr.as_deref(), Some("Fontaine"));
        assert_eq!(decoded.en.as_deref(), Some("Fountain"));
        assert_eq!(decoded.de, None);
    }
}
