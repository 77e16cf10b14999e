use crate::value::Value;

/// Separator used by [`Stash::set`] and [`Stash::lookup`].
pub const DEFAULT_SEPARATOR: char = '.';

/// Insertion-ordered key/value store that parse results are written into.
///
/// Keys containing the path separator address nested stashes: writing
/// `"ports.src"` creates (or reuses) a map under `"ports"` and stores the
/// value under `"src"` inside it. Iteration order is the order in which
/// keys were first inserted, so a rendered stash lists fields in the order
/// the layout declared them.
///
/// ```text
///   set("count", 5)          { count: 5 }
///   set("ports.src", 80)     { count: 5, ports: { src: 80 } }
///   set("ports.dst", 3000)   { count: 5, ports: { src: 80, dst: 3000 } }
/// ```
///
/// Stashes are small (one entry per declared field), so entries live in
/// a `Vec` and lookups are linear.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stash {
    entries: Vec<(String, Value)>,
}

impl Stash {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Look up a top-level key. Separators are not interpreted.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert a top-level key, replacing any previous value in place.
    ///
    /// Returns the previous value. Replacing keeps the key's original
    /// position in iteration order.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if let Some(slot) = self.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Remove a top-level key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Write `value` at a separator-delimited path.
    ///
    /// Intermediate maps are created on demand. An intermediate segment
    /// that currently holds a non-map value is replaced by an empty map.
    pub fn insert_path(&mut self, path: &str, separator: char, value: Value) {
        match path.split_once(separator) {
            None => {
                self.insert(path, value);
            }
            Some((head, rest)) => {
                self.child_map(head).insert_path(rest, separator, value);
            }
        }
    }

    /// Read the value at a separator-delimited path.
    #[must_use]
    pub fn get_path(&self, path: &str, separator: char) -> Option<&Value> {
        match path.split_once(separator) {
            None => self.get(path),
            Some((head, rest)) => self.get(head)?.as_map()?.get_path(rest, separator),
        }
    }

    /// Return the map stored at `path`, creating it (or replacing a
    /// non-map value) if needed.
    pub fn map_at_path(&mut self, path: &str, separator: char) -> &mut Stash {
        match path.split_once(separator) {
            None => self.child_map(path),
            Some((head, rest)) => self.child_map(head).map_at_path(rest, separator),
        }
    }

    fn child_map(&mut self, key: &str) -> &mut Stash {
        let needs_map = !matches!(self.get(key), Some(Value::Map(_)));
        if needs_map {
            self.insert(key, Value::Map(Stash::new()));
        }
        match self.get_mut(key) {
            Some(Value::Map(map)) => map,
            _ => unreachable!("entry {key:?} was just set to a map"),
        }
    }

    /// [`insert_path`](Self::insert_path) with [`DEFAULT_SEPARATOR`].
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        self.insert_path(path, DEFAULT_SEPARATOR, value.into());
    }

    /// [`get_path`](Self::get_path) with [`DEFAULT_SEPARATOR`].
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        self.get_path(path, DEFAULT_SEPARATOR)
    }

    /// Deep-merge `other` into `self`.
    ///
    /// Where both sides hold a map under the same key the maps are merged
    /// recursively. Any other collision is won by `other`. New keys are
    /// appended in `other`'s order.
    pub fn merge(&mut self, other: Stash) {
        for (key, value) in other.entries {
            let Value::Map(theirs) = value else {
                self.insert(key, value);
                continue;
            };
            if let Some(Value::Map(mine)) = self.get_mut(&key) {
                mine.merge(theirs);
                continue;
            }
            self.insert(key, Value::Map(theirs));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Stash {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut stash = Stash::new();
        for (key, value) in iter {
            stash.insert(key, value);
        }
        stash
    }
}

impl IntoIterator for Stash {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
