//! Multi-key associative index
//!
//! `Table` maps `k1 → k2 → value`, `HyperTable` maps `k1 → k2 → k3 → value`.
//! Intermediate levels are created on `set` and never pruned on removal, so
//! a row can outlive its last cell. Every level iterates in insertion order.
//! Lookups through a missing prefix answer `None`/`false`.

use super::ordered::OrderedMap;
use std::borrow::Borrow;
use std::hash::Hash;

/// Two-level map: row key → column key → value
#[derive(Debug, Clone)]
pub struct Table<K1, K2, V> {
    rows: OrderedMap<K1, OrderedMap<K2, V>>,
}

impl<K1, K2, V> Default for Table<K1, K2, V> {
    fn default() -> Self {
        Self {
            rows: OrderedMap::default(),
        }
    }
}

impl<K1, K2, V> Table<K1, K2, V>
where
    K1: Eq + Hash + Clone,
    K2: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` at `(k1, k2)`, returning the value it replaced
    pub fn set(&mut self, k1: K1, k2: K2, value: V) -> Option<V> {
        self.rows.get_or_default(k1).insert(k2, value)
    }

    pub fn get<Q1, Q2>(&self, k1: &Q1, k2: &Q2) -> Option<&V>
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        Q1: Hash + Eq + ?Sized,
        Q2: Hash + Eq + ?Sized,
    {
        self.rows.get(k1)?.get(k2)
    }

    pub fn get_mut<Q1, Q2>(&mut self, k1: &Q1, k2: &Q2) -> Option<&mut V>
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        Q1: Hash + Eq + ?Sized,
        Q2: Hash + Eq + ?Sized,
    {
        self.rows.get_mut(k1)?.get_mut(k2)
    }

    /// The inner map stored under `k1`
    pub fn row<Q1>(&self, k1: &Q1) -> Option<&OrderedMap<K2, V>>
    where
        K1: Borrow<Q1>,
        Q1: Hash + Eq + ?Sized,
    {
        self.rows.get(k1)
    }

    pub fn contains_row<Q1>(&self, k1: &Q1) -> bool
    where
        K1: Borrow<Q1>,
        Q1: Hash + Eq + ?Sized,
    {
        self.rows.contains_key(k1)
    }

    pub fn contains<Q1, Q2>(&self, k1: &Q1, k2: &Q2) -> bool
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        Q1: Hash + Eq + ?Sized,
        Q2: Hash + Eq + ?Sized,
    {
        self.rows.get(k1).is_some_and(|row| row.contains_key(k2))
    }

    /// Remove one cell. The row stays even if it is now empty.
    pub fn remove<Q1, Q2>(&mut self, k1: &Q1, k2: &Q2) -> Option<V>
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        Q1: Hash + Eq + ?Sized,
        Q2: Hash + Eq + ?Sized,
    {
        self.rows.get_mut(k1)?.remove(k2)
    }

    pub fn remove_row<Q1>(&mut self, k1: &Q1) -> Option<OrderedMap<K2, V>>
    where
        K1: Borrow<Q1>,
        Q1: Hash + Eq + ?Sized,
    {
        self.rows.remove(k1)
    }

    pub fn row_keys(&self) -> impl Iterator<Item = &K1> {
        self.rows.keys()
    }

    /// Every `(k1, k2, value)` triple in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&K1, &K2, &V)> {
        self.rows
            .iter()
            .flat_map(|(k1, row)| row.iter().map(move |(k2, v)| (k1, k2, v)))
    }

    /// Number of rows (not cells)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

/// Three-level map: row key → cell key → entry key → value
#[derive(Debug, Clone)]
pub struct HyperTable<K1, K2, K3, V> {
    rows: OrderedMap<K1, Table<K2, K3, V>>,
}

impl<K1, K2, K3, V> Default for HyperTable<K1, K2, K3, V> {
    fn default() -> Self {
        Self {
            rows: OrderedMap::default(),
        }
    }
}

impl<K1, K2, K3, V> HyperTable<K1, K2, K3, V>
where
    K1: Eq + Hash + Clone,
    K2: Eq + Hash + Clone,
    K3: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, k1: K1, k2: K2, k3: K3, value: V) -> Option<V> {
        self.rows.get_or_default(k1).set(k2, k3, value)
    }

    pub fn get<Q1, Q2, Q3>(&self, k1: &Q1, k2: &Q2, k3: &Q3) -> Option<&V>
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        K3: Borrow<Q3>,
        Q1: Hash + Eq + ?Sized,
        Q2: Hash + Eq + ?Sized,
        Q3: Hash + Eq + ?Sized,
    {
        self.rows.get(k1)?.get(k2, k3)
    }

    pub fn row<Q1>(&self, k1: &Q1) -> Option<&Table<K2, K3, V>>
    where
        K1: Borrow<Q1>,
        Q1: Hash + Eq + ?Sized,
    {
        self.rows.get(k1)
    }

    pub fn cell<Q1, Q2>(&self, k1: &Q1, k2: &Q2) -> Option<&OrderedMap<K3, V>>
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        Q1: Hash + Eq + ?Sized,
        Q2: Hash + Eq + ?Sized,
    {
        self.rows.get(k1)?.row(k2)
    }

    pub fn contains_row<Q1>(&self, k1: &Q1) -> bool
    where
        K1: Borrow<Q1>,
        Q1: Hash + Eq + ?Sized,
    {
        self.rows.contains_key(k1)
    }

    pub fn contains_cell<Q1, Q2>(&self, k1: &Q1, k2: &Q2) -> bool
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        Q1: Hash + Eq + ?Sized,
        Q2: Hash + Eq + ?Sized,
    {
        self.rows.get(k1).is_some_and(|row| row.contains_row(k2))
    }

    pub fn contains<Q1, Q2, Q3>(&self, k1: &Q1, k2: &Q2, k3: &Q3) -> bool
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        K3: Borrow<Q3>,
        Q1: Hash + Eq + ?Sized,
        Q2: Hash + Eq + ?Sized,
        Q3: Hash + Eq + ?Sized,
    {
        self.rows.get(k1).is_some_and(|row| row.contains(k2, k3))
    }

    pub fn remove<Q1, Q2, Q3>(&mut self, k1: &Q1, k2: &Q2, k3: &Q3) -> Option<V>
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        K3: Borrow<Q3>,
        Q1: Hash + Eq + ?Sized,
        Q2: Hash + Eq + ?Sized,
        Q3: Hash + Eq + ?Sized,
    {
        self.rows.get_mut(k1)?.remove(k2, k3)
    }

    pub fn remove_cell<Q1, Q2>(&mut self, k1: &Q1, k2: &Q2) -> Option<OrderedMap<K3, V>>
    where
        K1: Borrow<Q1>,
        K2: Borrow<Q2>,
        Q1: Hash + Eq + ?Sized,
        Q2: Hash + Eq + ?Sized,
    {
        self.rows.get_mut(k1)?.remove_row(k2)
    }

    pub fn remove_row<Q1>(&mut self, k1: &Q1) -> Option<Table<K2, K3, V>>
    where
        K1: Borrow<Q1>,
        Q1: Hash + Eq + ?Sized,
    {
        self.rows.remove(k1)
    }

    pub fn row_keys(&self) -> impl Iterator<Item = &K1> {
        self.rows.keys()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_table_set_and_get() {
        let mut table: Table<String, String, u32> = Table::new();
        table.set("taxa".into(), "projects".into(), 100);
        table.set("taxa".into(), "users".into(), 0);

        assert_eq!(table.get("taxa", "projects"), Some(&100));
        assert_eq!(table.get("taxa", "media"), None);
        assert_eq!(table.get("media", "taxa"), None);
        assert!(table.contains_row("taxa"));
        assert!(!table.contains("media", "taxa"));
    }

    #[test]
    fn test_table_row_order_follows_insertion() {
        let mut table: Table<&str, &str, u32> = Table::new();
        table.set("a", "h", 8);
        table.set("a", "b", 4);
        table.set("a", "c", 1);

        let row: Vec<_> = table.row("a").unwrap().keys().copied().collect();
        assert_eq!(row, vec!["h", "b", "c"]);
    }

    #[test]
    fn test_table_remove_keeps_empty_row() {
        let mut table: Table<&str, &str, u32> = Table::new();
        table.set("a", "b", 1);

        assert_eq!(table.remove("a", "b"), Some(1));
        assert!(table.contains_row("a"));
        assert!(!table.contains("a", "b"));
        assert_eq!(table.remove("missing", "b"), None);
    }

    #[test]
    fn test_hypertable_prefix_queries() {
        let mut index: HyperTable<&str, &str, &str, u32> = HyperTable::new();
        index.set("cells", "taxa", "taxon_id", 10);

        assert!(index.contains("cells", "taxa", "taxon_id"));
        assert!(index.contains_cell("cells", "taxa"));
        assert!(index.contains_row("cells"));
        assert_eq!(index.get("cells", "taxa", "taxon_id"), Some(&10));
    }

    #[test]
    fn test_hypertable_missing_prefix_is_false() {
        let mut index: HyperTable<&str, &str, &str, u32> = HyperTable::new();
        index.set("cells", "taxa", "taxon_id", 10);

        assert!(!index.contains_row("media"));
        assert!(!index.contains_cell("media", "taxa"));
        assert!(!index.contains("media", "taxa", "taxon_id"));
        assert!(!index.contains("cells", "characters", "character_id"));
        assert!(index.get("cells", "taxa", "character_id").is_none());
        assert!(index.cell("nope", "nope").is_none());
    }

    #[test]
    fn test_hypertable_remove_cell_keeps_row() {
        let mut index: HyperTable<&str, &str, &str, u32> = HyperTable::new();
        index.set("cells", "taxa", "taxon_id", 10);
        index.set("cells", "matrices", "matrix_id", 10);

        assert!(index.remove_cell("cells", "taxa").is_some());
        assert!(index.contains_row("cells"));
        assert!(!index.contains_cell("cells", "taxa"));
        assert!(index.contains("cells", "matrices", "matrix_id"));
    }
}
