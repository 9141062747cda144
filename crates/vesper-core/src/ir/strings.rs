//! String interning for IR symbols.
//!
//! String-keyed array accesses are bucketed by key during alias collection,
//! so keys must be cheap to hash and compare. The interner hands out dense
//! [`Symbol`] handles; the actual text is only needed when rendering dumps.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// A handle to an interned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(pub u32);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Thread-safe string interner.
///
/// Shared via `Arc` between the frontend that builds units and the analyses
/// that render them; interning takes `&self`.
#[derive(Debug, Default)]
pub struct StringInterner {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    map: FxHashMap<Arc<str>, Symbol>,
    strings: Vec<Arc<str>>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `s`, returning the existing symbol if it was seen before.
    pub fn get_or_intern(&self, s: &str) -> Symbol {
        if let Some(&sym) = self.inner.read().map.get(s) {
            return sym;
        }
        let mut inner = self.inner.write();
        // Re-check under the write lock; another thread may have won.
        if let Some(&sym) = inner.map.get(s) {
            return sym;
        }
        let sym = Symbol(inner.strings.len() as u32);
        let text: Arc<str> = Arc::from(s);
        inner.strings.push(Arc::clone(&text));
        inner.map.insert(text, sym);
        sym
    }

    /// Resolve a symbol back to its text.
    pub fn resolve(&self, sym: Symbol) -> Option<Arc<str>> {
        self.inner.read().strings.get(sym.0 as usize).cloned()
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.inner.read().strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_round_trip() {
        let interner = StringInterner::new();
        let a = interner.get_or_intern("key");
        let b = interner.get_or_intern("other");
        let a2 = interner.get_or_intern("key");

        assert_eq!(a, a2, "re-interning must return the same symbol");
        assert_ne!(a, b);
        assert_eq!(interner.resolve(a).as_deref(), Some("key"));
        assert_eq!(interner.resolve(b).as_deref(), Some("other"));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn test_resolve_unknown() {
        let interner = StringInterner::new();
        assert!(interner.resolve(Symbol(7)).is_none());
    }
}
