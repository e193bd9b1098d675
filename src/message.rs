//! Inbound AMI items: responses, events and follows blocks

use crate::headers::{AmiHeader, ResponseStatus};
use std::collections::HashMap;
use std::fmt;

/// One item parsed off the wire.
///
/// Field names are stored trimmed and lowercased; lookups through
/// [`get()`](Self::get) fold the requested name the same way, so
/// `msg.get("ActionID")` and `msg.get("actionid")` are equivalent.
/// A block with no fields at all still yields an (empty) message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmiMessage {
    fields: HashMap<String, String>,
}

impl AmiMessage {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field by name (case-insensitive).
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        let name = name.as_ref();
        match self
            .fields
            .get(name)
        {
            Some(v) => Some(v.as_str()),
            None => self
                .fields
                .get(&normalize_field_name(name))
                .map(|s| s.as_str()),
        }
    }

    /// `true` if the field is present, even with an empty value.
    pub fn contains(&self, name: impl AsRef<str>) -> bool {
        self.get(name)
            .is_some()
    }

    /// Set or overwrite a field. The name is normalized.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.fields
            .insert(normalize_field_name(name), value.into());
    }

    /// Remove a field, returning its value if it existed.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields
            .remove(&normalize_field_name(name))
    }

    /// All fields, keyed by lowercase name.
    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields
            .len()
    }

    /// `true` for a block that carried no fields.
    pub fn is_empty(&self) -> bool {
        self.fields
            .is_empty()
    }

    /// Raw `Response:` value.
    pub fn response(&self) -> Option<&str> {
        self.non_empty(AmiHeader::Response)
    }

    /// Parsed `Response:` value, if recognized.
    pub fn status(&self) -> Option<ResponseStatus> {
        self.response()?
            .parse()
            .ok()
    }

    /// `true` when `Response:` is `Error` (any case).
    pub fn is_error(&self) -> bool {
        self.response()
            .is_some_and(|r| r.eq_ignore_ascii_case(ResponseStatus::Error.as_str()))
    }

    /// Correlation ID echoed by the server.
    pub fn action_id(&self) -> Option<&str> {
        self.non_empty(AmiHeader::ActionId)
    }

    /// `Event:` name for unsolicited notifications.
    pub fn event(&self) -> Option<&str> {
        self.non_empty(AmiHeader::Event)
    }

    /// `UserEvent:` type, carried by `Event: UserEvent`.
    pub fn user_event(&self) -> Option<&str> {
        self.non_empty(AmiHeader::UserEvent)
    }

    /// Raw command output of a follows block.
    pub fn content(&self) -> Option<&str> {
        self.non_empty(AmiHeader::Content)
    }

    /// Human-readable `Message:` text.
    pub fn message(&self) -> Option<&str> {
        self.non_empty(AmiHeader::Message)
    }

    /// `Privilege:` class list of an event, e.g. `call,all`.
    pub fn privilege(&self) -> Option<&str> {
        self.non_empty(AmiHeader::Privilege)
    }

    // Empty values count as absent for classification, matching how the
    // server omits rather than blanks these fields.
    fn non_empty(&self, header: AmiHeader) -> Option<&str> {
        self.fields
            .get(header.as_str())
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }
}

impl FromIterator<(String, String)> for AmiMessage {
    /// Later duplicates overwrite earlier ones.
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut message = AmiMessage::new();
        for (name, value) in iter {
            message.insert(&name, value);
        }
        message
    }
}

impl fmt::Display for AmiMessage {
    /// Renders the fields in sorted order, one `name: value` per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self
            .fields
            .keys()
            .collect();
        names.sort();
        for name in names {
            writeln!(f, "{}: {}", name, self.fields[name])?;
        }
        Ok(())
    }
}

/// Trim and lowercase a field name.
pub(crate) fn normalize_field_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
}
