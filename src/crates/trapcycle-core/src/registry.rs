use std::fmt;

/// Insertion-ordered name table with case-insensitive lookup
///
/// Backs the scale table; user code can [`Registry::add`] its own entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Registry<T> {
    name: String,
    entries: Vec<(String, T)>,
}

impl<T> Registry<T> {
    /// Create an empty registry with a display name
    pub fn new(name: impl Into<String>) -> Self {
        Registry {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn position(&self, key: &str) -> Option<usize> {
        let key = key.to_lowercase();
        self.entries.iter().position(|(k, _)| *k == key)
    }

    /// Look up an entry, ignoring case
    pub fn get(&self, key: &str) -> Option<&T> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Insert or replace an entry; a replaced entry keeps its position
    pub fn add(&mut self, key: &str, value: T) {
        match self.position(key) {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key.to_lowercase(), value)),
        }
    }

    /// Entry names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> fmt::Display for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}: {}>", self.name, self.names().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let mut reg = Registry::new("things");
        reg.add("Major", 1);
        assert_eq!(reg.get("MAJOR"), Some(&1));
        assert!(reg.contains("major"));
        assert!(!reg.contains("minor"));
    }

    #[test]
    fn test_insertion_order_and_replace() {
        let mut reg = Registry::new("things");
        reg.add("b", 1);
        reg.add("a", 2);
        reg.add("B", 3);
        assert_eq!(reg.names(), vec!["b", "a"]);
        assert_eq!(reg.get("b"), Some(&3));
        assert_eq!(reg.to_string(), "<things: b, a>");
        assert_eq!(reg.len(), 2);
    }
}
