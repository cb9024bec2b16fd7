//! Byte-value maps (§4.3): immutable, bidirectional numeric↔record tables.
//!
//! Every controller variant owns a set of these for its protocol
//! enumerations (circuit function, heat mode, heat source, pump type,
//! chlorinator status bit, ...). All protocol-level comparisons and API
//! serializations go through a map; the engine never compares names as
//! strings internally — callers look up by `val` and get a `name`/`desc`
//! out, never the reverse inside a hot path.

use std::collections::HashMap;

/// One entry in a byte-value map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRecord {
    pub val: u8,
    pub name: &'static str,
    pub desc: &'static str,
}

/// Bidirectional numeric↔record table. Built once and never mutated again;
/// construction failures (duplicate `val`) panic immediately since maps are
/// compiled-in constants, not user input.
#[derive(Debug, Clone)]
pub struct ByteValueMap {
    by_val: HashMap<u8, ValueRecord>,
    by_name: HashMap<&'static str, u8>,
}

impl ByteValueMap {
    pub fn new(entries: &[(u8, &'static str, &'static str)]) -> Self {
        let mut by_val = HashMap::with_capacity(entries.len());
        let mut by_name = HashMap::with_capacity(entries.len());

        for &(val, name, desc) in entries {
            let prev = by_val.insert(
                val,
                ValueRecord {
                    val,
                    name,
                    desc,
                },
            );
            assert!(prev.is_none(), "duplicate byte-value map entry for {val}");
            by_name.insert(name, val);
        }

        Self { by_val, by_name }
    }

    pub fn get(&self, val: u8) -> Option<&ValueRecord> {
        self.by_val.get(&val)
    }

    pub fn by_name(&self, name: &str) -> Option<&ValueRecord> {
        self.by_name.get(name).and_then(|val| self.by_val.get(val))
    }

    pub fn contains(&self, val: u8) -> bool {
        self.by_val.contains_key(&val)
    }

    pub fn len(&self) -> usize {
        self.by_val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_val.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_both_directions() {
        let map = ByteValueMap::new(&[(0, "off", "Off"), (1, "on", "On")]);
        assert_eq!(map.get(1).unwrap().name, "on");
        assert_eq!(map.by_name("off").unwrap().val, 0);
        assert!(map.get(2).is_none());
    }

    #[test]
    #[should_panic(expected = "duplicate")]
    fn duplicate_val_panics() {
        ByteValueMap::new(&[(0, "a", ""), (0, "b", "")]);
    }
}
