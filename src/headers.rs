//! Outgoing request headers.

/// An ordered set of request headers with last-write-wins semantics.
///
/// Names compare case-insensitively. Setting a name that is already present
/// replaces its value in place, keeping the position of the first write and the
/// spelling of the latest one. Names and values are not validated here; the
/// transport rejects what it cannot send.
///
/// # Examples
///
/// ```
/// use hostwire::HeaderSet;
///
/// let mut headers = HeaderSet::new();
/// headers.set("X-Trace", "1");
/// headers.set("x-trace", "2");
///
/// assert_eq!(headers.len(), 1);
/// assert_eq!(headers.get("X-TRACE"), Some("2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    /// Creates an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header, overwriting any existing value with the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => *entry = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    /// Returns the value of a header by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if a header with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes a header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self
            .entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(index).1)
    }

    /// Applies every header of `other` on top of this set, in order.
    pub fn overlay(&mut self, other: &HeaderSet) {
        for (name, value) in other.iter() {
            self.set(name, value);
        }
    }

    /// Iterates over the headers as `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = HeaderSet::new();
        headers.extend(iter);
        headers
    }
}

impl<K, V> Extend<(K, V)> for HeaderSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.set(name, value);
        }
    }
}
