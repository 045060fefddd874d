use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for node and page ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Counter shared by every generated id, so `rect_3` and `text_3` never
/// come from the same tick.
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// A lightweight, interned identifier for nodes, panels and pages.
/// Internally a 4-byte `Spur` index, so copying and hashing are O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Intern a string as a NodeId, or return the existing handle.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a fresh id with a type prefix (e.g. `rect_1`, `panel_2`).
    ///
    /// Uniqueness within a page is the store's job: a deserialized page may
    /// already hold a matching id, so callers check before inserting.
    pub fn with_prefix(prefix: &str) -> Self {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{prefix}_{n}"))
    }

    /// True for the empty string id, which is never valid in a document.
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = NodeId::intern("splash_panel");
        let b = NodeId::intern("splash_panel");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "splash_panel");
    }

    #[test]
    fn generated_ids_are_unique_and_prefixed() {
        let a = NodeId::with_prefix("bubble");
        let b = NodeId::with_prefix("bubble");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("bubble_"));
    }

    #[test]
    fn display_is_bare_debug_is_tagged() {
        let id = NodeId::intern("hero");
        assert_eq!(id.to_string(), "hero");
        assert_eq!(format!("{id:?}"), "@hero");
    }
}
