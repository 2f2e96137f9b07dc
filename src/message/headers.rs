/*
 * Copyright Stalwart Labs Ltd. See the COPYING
 * file at the top-level directory of this distribution.
 *
 * Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
 * https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
 * <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
 * option. This file may not be copied, modified, or distributed
 * except according to those terms.
 */

use std::fmt::Display;

/// Ordered header section. Names are kept in canonical form, each name maps
/// to the list of values it was given, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value to `name`, creating the header at the end of the section
    /// if it is not present yet.
    pub fn append(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let name = canonical_name(name.as_ref());
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, values)) => values.push(value.into()),
            None => self.entries.push((name, vec![value.into()])),
        }
    }

    /// Replaces all values of `name`, keeping its position if present.
    pub fn set<I, V>(&mut self, name: impl AsRef<str>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let name = canonical_name(name.as_ref());
        let values = values.into_iter().map(Into::into).collect();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, current)) => *current = values,
            None => self.entries.push((name, values)),
        }
    }

    /// Returns the first value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name)
            .and_then(|values| values.first())
            .map(|value| value.as_str())
    }

    pub fn get_all(&self, name: &str) -> Option<&[String]> {
        let name = canonical_name(name);
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let name = canonical_name(name);
        let pos = self.entries.iter().position(|(key, _)| *key == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the header block, one `Key: v1 v2\r\n` line per header. The
    /// blank line separating headers from the body is not included.
    pub fn to_block(&self) -> String {
        let block = self.to_string();
        log::debug!("Header data:\n{block}");
        block
    }
}

impl Display for Headers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (key, values) in &self.entries {
            write!(f, "{}: {}\r\n", key, values.join(" "))?;
        }
        Ok(())
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// Canonical MIME form of a header name: the first letter and any letter
/// following a hyphen are upper case, the rest lower case. Names containing
/// bytes outside the token set are returned unchanged.
pub fn canonical_name(name: &str) -> String {
    if !name.bytes().all(is_token_byte) {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|ch| {
            let ch = if upper {
                ch.to_ascii_uppercase()
            } else {
                ch.to_ascii_lowercase()
            };
            upper = ch == '-';
            ch
        })
        .collect()
}

fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&byte)
}
