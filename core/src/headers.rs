//! Case-insensitive header multi-map.
//!
//! # Design
//! Names are stored lowercased in a `BTreeMap`, so lookups are
//! case-insensitive and iteration is deterministic (sorted by name)
//! regardless of how a server capitalized its headers. Each name keeps
//! every appended value in insertion order; `get` joins them with `", "`.

use std::collections::BTreeMap;

use log::warn;

use crate::error::FetchError;
use crate::http::is_token_byte;

/// Header names that describe a request body and are dropped together
/// with it when a redirect rewrites the request to GET.
pub(crate) const REQUEST_BODY_HEADERS: [&str; 5] = [
    "content-encoding",
    "content-language",
    "content-length",
    "content-location",
    "content-type",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    map: BTreeMap<String, Vec<String>>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw header block as reported by a transport.
    ///
    /// Lines may end in CRLF or LF. Lines starting with a space or tab
    /// continue the previous header. Blank lines, lines without a colon and
    /// lines with an invalid name are skipped.
    pub fn from_raw(block: &str) -> Self {
        let mut lines: Vec<String> = Vec::new();
        for line in block.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.starts_with([' ', '\t']) {
                if let Some(prev) = lines.last_mut() {
                    prev.push(' ');
                    prev.push_str(line.trim());
                    continue;
                }
            }
            lines.push(line.to_string());
        }

        let mut headers = Headers::new();
        for line in lines.iter().filter(|l| !l.trim().is_empty()) {
            let Some((name, value)) = line.split_once(':') else {
                warn!("skipping header line without a colon: {line:?}");
                continue;
            };
            if let Err(e) = headers.append(name.trim(), value) {
                warn!("skipping malformed header line: {e}");
            }
        }
        headers
    }

    /// Build headers from name/value pairs, validating each one.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, FetchError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers = Headers::new();
        for (name, value) in pairs {
            headers.append(name.as_ref(), value.as_ref())?;
        }
        Ok(headers)
    }

    /// Add a value without replacing existing ones.
    pub fn append(&mut self, name: &str, value: &str) -> Result<(), FetchError> {
        let (name, value) = normalize(name, value)?;
        self.map.entry(name).or_default().push(value);
        Ok(())
    }

    /// Replace every value for `name` with `value`.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), FetchError> {
        let (name, value) = normalize(name, value)?;
        self.map.insert(name, vec![value]);
        Ok(())
    }

    /// All values for `name` joined by `", "`.
    pub fn get(&self, name: &str) -> Option<String> {
        self.map
            .get(&name.to_ascii_lowercase())
            .map(|values| values.join(", "))
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.map
            .get(&name.to_ascii_lowercase())
            .map(|values| values.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.map.contains_key(&name.to_ascii_lowercase())
    }

    pub fn delete(&mut self, name: &str) {
        self.map.remove(&name.to_ascii_lowercase());
    }

    /// `(name, combined value)` pairs sorted by lowercase name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.map
            .iter()
            .map(|(name, values)| (name.as_str(), values.join(", ")))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.map.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = String> + '_ {
        self.map.values().map(|values| values.join(", "))
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// One pair per stored value, as handed to a transport.
    pub(crate) fn to_pairs(&self) -> Vec<(String, String)> {
        self.map
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.clone(), v.clone())))
            .collect()
    }

    /// Copy in every header from `defaults` whose name is not already set.
    pub(crate) fn fill_from(&mut self, defaults: &Headers) {
        for (name, values) in &defaults.map {
            if !self.map.contains_key(name) {
                self.map.insert(name.clone(), values.clone());
            }
        }
    }
}

impl IntoIterator for Headers {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.to_pairs().into_iter()
    }
}

/// Lowercase and validate the name; strip leading and trailing HTTP
/// whitespace from the value and reject CR, LF and NUL.
fn normalize(name: &str, value: &str) -> Result<(String, String), FetchError> {
    if name.is_empty() || !name.bytes().all(is_token_byte) {
        return Err(FetchError::InvalidHeaderName(name.to_string()));
    }
    let value = value.trim_matches([' ', '\t', '\r', '\n']);
    if value.contains(['\r', '\n', '\0']) {
        return Err(FetchError::InvalidHeaderValue(name.to_string()));
    }
    Ok((name.to_ascii_lowercase(), value.to_string()))
}
