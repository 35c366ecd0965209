use std::collections::HashMap;

/// A `KEY=VALUE` entry from a `.env` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

/// Key-unique mapping that keeps entries in first-seen order.
///
/// Inserting an existing key replaces its value in place, so a file parsed
/// with duplicate keys keeps the position of the first occurrence and the
/// value of the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvMap {
    entries: Vec<Entry>,
    by_key: HashMap<String, usize>,
}

impl EnvMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.by_key
            .get(key)
            .map(|idx| self.entries[*idx].value.as_str())
    }

    /// Set `key` to `value`, returning the previous value if there was one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if let Some(existing_idx) = self.by_key.get(&key).copied() {
            return Some(std::mem::replace(
                &mut self.entries[existing_idx].value,
                value,
            ));
        }

        self.by_key.insert(key.clone(), self.entries.len());
        self.entries.push(Entry { key, value });
        None
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.by_key.remove(key)?;
        let removed = self.entries.remove(idx);
        for entry in &self.entries[idx..] {
            if let Some(slot) = self.by_key.get_mut(&entry.key) {
                *slot -= 1;
            }
        }
        Some(removed.value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    /// Keys in lexicographic order.
    pub fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.keys().map(str::to_owned).collect();
        keys.sort();
        keys
    }
}

impl<K, V> FromIterator<(K, V)> for EnvMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for EnvMap {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a EnvMap {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_existing_key_keeps_position() {
        let mut map = EnvMap::new();
        map.insert("A", "1");
        map.insert("B", "2");
        let previous = map.insert("A", "3");

        assert_eq!(previous.as_deref(), Some("1"));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(map.get("A"), Some("3"));
    }

    #[test]
    fn remove_reindexes_following_entries() {
        let mut map: EnvMap = [("A", "1"), ("B", "2"), ("C", "3")].into_iter().collect();

        assert_eq!(map.remove("A").as_deref(), Some("1"));
        assert_eq!(map.remove("A"), None);
        assert_eq!(map.get("B"), Some("2"));
        assert_eq!(map.get("C"), Some("3"));

        map.insert("C", "updated");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("C"), Some("updated"));
    }

    #[test]
    fn sorted_keys_are_lexicographic() {
        let map: EnvMap = [("b", "1"), ("A", "2"), ("a", "3")].into_iter().collect();
        assert_eq!(map.sorted_keys(), vec!["A", "a", "b"]);
    }
}
