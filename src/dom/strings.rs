//! String interning pool.
//!
//! Element names, attribute names, and content are deduplicated into a
//! single buffer. The document owns its strings outright, so the input
//! text can be dropped after the build.
//!
//! Hash-based lookup with a per-hash ID list handles the rare collision.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// String interning pool.
///
/// ID 0 is reserved for the empty string.
#[derive(Debug)]
pub struct StringPool {
    /// All interned string data, concatenated.
    buf: String,
    /// (offset, len) into `buf`, indexed by string ID.
    spans: Vec<(u32, u32)>,
    /// Content hash to IDs with that hash.
    index: HashMap<u64, Vec<u32>>,
}

impl StringPool {
    pub fn new() -> Self {
        StringPool {
            buf: String::with_capacity(4096),
            spans: vec![(0, 0)],
            index: HashMap::new(),
        }
    }

    #[inline]
    fn hash_of(s: &str) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a string, returning its ID. Identical content always maps to
    /// the same ID.
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }

        let hash = Self::hash_of(s);
        if let Some(ids) = self.index.get(&hash) {
            for &id in ids {
                if self.get(id) == s {
                    return id;
                }
            }
        }

        let offset = self.buf.len() as u32;
        self.buf.push_str(s);
        let id = self.spans.len() as u32;
        self.spans.push((offset, s.len() as u32));
        self.index.entry(hash).or_default().push(id);
        id
    }

    /// Resolve an ID. ID 0 and out-of-range IDs resolve to "".
    #[inline]
    pub fn get(&self, id: u32) -> &str {
        match self.spans.get(id as usize) {
            Some(&(offset, len)) => &self.buf[offset as usize..(offset + len) as usize],
            None => "",
        }
    }

    /// Number of unique strings stored, counting the reserved empty entry.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.len() <= 1
    }
}

impl Default for StringPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_get() {
        let mut pool = StringPool::new();
        let id = pool.intern("hello");
        assert!(id > 0);
        assert_eq!(pool.get(id), "hello");
    }

    #[test]
    fn test_duplicate_returns_same_id() {
        let mut pool = StringPool::new();
        let id1 = pool.intern("hello");
        let id2 = pool.intern("hello");
        assert_eq!(id1, id2);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_distinct_strings() {
        let mut pool = StringPool::new();
        let id1 = pool.intern("hello");
        let id2 = pool.intern("world");
        assert_ne!(id1, id2);
        assert_eq!(pool.get(id1), "hello");
        assert_eq!(pool.get(id2), "world");
    }

    #[test]
    fn test_empty_string_is_zero() {
        let mut pool = StringPool::new();
        assert_eq!(pool.intern(""), 0);
        assert_eq!(pool.get(0), "");
        assert!(pool.is_empty());
    }

    #[test]
    fn test_out_of_range_id() {
        let pool = StringPool::new();
        assert_eq!(pool.get(999), "");
    }
}
