//! Generic keyed collection shared by every entity kind (§4.6): `get`,
//! `find`, `upsert`, and `remove` with stable iteration order by id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Id;

/// Minimal diff produced by [`Collection::upsert`] / [`Collection::remove`].
/// The Change Engine applies it, marks the owning root dirty, and fans it
/// out as an event carrying the post-image only (§4.6).
#[derive(Debug, Clone)]
pub struct Patch<T> {
    pub id: Id,
    pub before: Option<T>,
    pub after: Option<T>,
}

impl<T: PartialEq> Patch<T> {
    /// A patch where before == after is a no-op: no event, no dirtying.
    /// This is how `setCircuitState(id, on)` called twice in a row
    /// coalesces at the model level (§8 idempotence law).
    pub fn is_noop(&self) -> bool {
        self.before == self.after
    }
}

/// A keyed container of entities of one kind, ordered by id. Serializes as
/// a plain `{id: entity}` JSON object, matching the persisted-file shape
/// in §6 ("top-level keyed container per entity kind").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    items: BTreeMap<Id, T>,
}

impl<T: Clone> Collection<T> {
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    pub fn get(&self, id: Id) -> Option<&T> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: Id) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.items.contains_key(&id)
    }

    pub fn find<F>(&self, predicate: F) -> Vec<&T>
    where
        F: Fn(&T) -> bool,
    {
        self.items.values().filter(|item| predicate(item)).collect()
    }

    /// Iterate in ascending id order — the "stable iteration order by id"
    /// invariant from §4.6.
    pub fn iter(&self) -> impl Iterator<Item = (&Id, &T)> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert or replace the entity at `id`, returning the diff.
    pub fn upsert(&mut self, id: Id, item: T) -> Patch<T>
    where
        T: PartialEq,
    {
        let before = self.items.insert(id, item.clone());
        Patch {
            id,
            before,
            after: Some(item),
        }
    }

    /// Mutate the entity at `id` in place via `f`, returning the diff (or
    /// `None` if no such entity exists).
    pub fn mutate<F>(&mut self, id: Id, f: F) -> Option<Patch<T>>
    where
        T: PartialEq,
        F: FnOnce(&mut T),
    {
        let before = self.items.get(&id)?.clone();
        let entry = self.items.get_mut(&id)?;
        f(entry);
        let after = entry.clone();
        Some(Patch {
            id,
            before: Some(before),
            after: Some(after),
        })
    }

    pub fn remove(&mut self, id: Id) -> Option<Patch<T>> {
        let before = self.items.remove(&id)?;
        Some(Patch {
            id,
            before: Some(before),
            after: None,
        })
    }

    /// Remove every item whose id is not present in `valid_ids`. Used at
    /// load time to prune orphan state (§3 invariant: "Every state item's
    /// id references an existing config item ... orphan state is pruned
    /// on load"). Returns the number pruned.
    pub fn prune_orphans(&mut self, valid_ids: &std::collections::BTreeSet<Id>) -> usize {
        let before = self.items.len();
        self.items.retain(|id, _| valid_ids.contains(id));
        before - self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Dummy {
        name: String,
    }

    #[test]
    fn upsert_and_get() {
        let mut c = Collection::new();
        let patch = c.upsert(1, Dummy { name: "a".into() });
        assert!(patch.before.is_none());
        assert_eq!(c.get(1).unwrap().name, "a");
    }

    #[test]
    fn repeated_upsert_same_value_is_noop() {
        let mut c = Collection::new();
        c.upsert(1, Dummy { name: "a".into() });
        let patch = c.upsert(1, Dummy { name: "a".into() });
        assert!(patch.is_noop());
    }

    #[test]
    fn iteration_is_id_ordered() {
        let mut c = Collection::new();
        c.upsert(3, Dummy { name: "c".into() });
        c.upsert(1, Dummy { name: "a".into() });
        c.upsert(2, Dummy { name: "b".into() });
        let ids: Vec<Id> = c.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn prune_orphans_removes_unreferenced() {
        let mut c = Collection::new();
        c.upsert(1, Dummy { name: "a".into() });
        c.upsert(2, Dummy { name: "b".into() });
        let valid = std::collections::BTreeSet::from([1]);
        let pruned = c.prune_orphans(&valid);
        assert_eq!(pruned, 1);
        assert!(c.get(2).is_none());
    }
}
