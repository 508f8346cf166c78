use std::fmt;

use crate::error::{RouterError, RouterResult};

/// Header fields with case-insensitive names, kept in insertion order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    // (lowercase name, name as given, value)
    fields: Vec<(String, String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Headers::default()
    }

    /// Sets `name`, replacing any value it had under any casing
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl AsRef<str>) {
        let name = name.as_ref();
        let key = name.to_ascii_lowercase();
        let value = value.as_ref().to_string();
        match self.fields.iter_mut().find(|(k, _, _)| *k == key) {
            Some(field) => {
                field.1 = name.to_string();
                field.2 = value;
            }
            None => self.fields.push((key, name.to_string(), value)),
        }
    }

    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        let key = name.as_ref().to_ascii_lowercase();
        self.fields
            .iter()
            .find(|(k, _, _)| *k == key)
            .map(|(_, _, v)| v.as_str())
    }

    pub fn contains_key(&self, name: impl AsRef<str>) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Names as they were inserted
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(_, k, v)| (k.as_str(), v.as_str()))
    }

    /// `None` without the header; a value that is not a length is a bad request
    pub fn content_length(&self) -> RouterResult<Option<usize>> {
        self.get("content-length")
            .map(|v| {
                v.trim()
                    .parse::<usize>()
                    .map_err(|_| RouterError::bad_request(format!("Invalid Content-Length: {}", v)))
            })
            .transpose()
    }

    /// Parses `Name: value` lines, skipping blank and colon-less ones
    pub fn from_lines<'a>(lines: impl Iterator<Item = &'a str>) -> Self {
        let mut headers = Headers::new();
        lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim(), value.trim()))
            .filter(|(name, _)| !name.is_empty())
            .for_each(|(name, value)| headers.insert(name, value));
        headers
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            write!(f, "{}: {}\r\n", name, value)?;
        }
        Ok(())
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}
