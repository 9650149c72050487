use serde::{Deserialize, Serialize};

/// One table cell as handed over by the page-fetch layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Value of the `class` attribute; `None` when the element carried none
    pub class_tag: Option<String>,
    pub text: String,
    /// First link target inside the cell, if any
    pub href: Option<String>,
}

impl Cell {
    pub fn new(class_tag: &str, text: &str) -> Self {
        Self {
            class_tag: Some(class_tag.to_string()),
            text: text.to_string(),
            href: None,
        }
    }

    pub fn unclassed(text: &str) -> Self {
        Self {
            class_tag: None,
            text: text.to_string(),
            href: None,
        }
    }

    /// True when one of the whitespace-separated class names equals `tag`.
    pub fn has_class(&self, tag: &str) -> bool {
        self.class_tag
            .as_deref()
            .map(|classes| classes.split_whitespace().any(|c| c == tag))
            .unwrap_or(false)
    }
}

/// Untyped record prior to cleaning: field name to raw text, in source order.
///
/// A field that is absent and a field whose text is missing are treated the
/// same way by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    fields: Vec<(String, Option<String>)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.insert(name, Some(value.to_string()));
        self
    }

    pub fn insert(&mut self, name: &str, value: Option<String>) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Raw text of `name`; `None` for both absent and missing values.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
