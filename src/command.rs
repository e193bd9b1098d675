//! Outbound actions and their wire rendering

use crate::{
    constants::{HEADER_ACTION_ID, LINE_TERMINATOR},
    error::{AmiError, AmiResult},
    headers::AmiHeader,
    message::normalize_field_name,
};
use std::collections::BTreeMap;
use std::fmt;

/// Validate that a user-provided string contains no newline characters.
///
/// AMI is line-delimited; embedded newlines would allow injection of
/// arbitrary fields or whole extra actions.
fn validate_no_newlines(s: &str, context: &str) -> AmiResult<()> {
    if s.contains('\n') || s.contains('\r') {
        return Err(AmiError::protocol_error(format!(
            "{} must not contain newlines",
            context
        )));
    }
    Ok(())
}

/// Value of one action field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionValue {
    /// Rendered as-is.
    Scalar(String),
    /// Rendered comma-joined: `a,b,c`.
    List(Vec<String>),
    /// Rendered as comma-joined `name=value` pairs, in insertion order.
    KeyValueSet(Vec<(String, String)>),
}

impl ActionValue {
    /// Wire rendering of the value.
    pub fn render(&self) -> String {
        match self {
            ActionValue::Scalar(s) => s.clone(),
            ActionValue::List(items) => items.join(","),
            ActionValue::KeyValueSet(pairs) => pairs
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl fmt::Display for ActionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for ActionValue {
    fn from(s: &str) -> Self {
        ActionValue::Scalar(s.to_string())
    }
}

impl From<String> for ActionValue {
    fn from(s: String) -> Self {
        ActionValue::Scalar(s)
    }
}

impl From<&String> for ActionValue {
    fn from(s: &String) -> Self {
        ActionValue::Scalar(s.clone())
    }
}

macro_rules! scalar_from_display {
    ($($t:ty),+) => {
        $(
            impl From<$t> for ActionValue {
                fn from(v: $t) -> Self {
                    ActionValue::Scalar(v.to_string())
                }
            }
        )+
    };
}

scalar_from_display!(bool, i32, i64, u16, u32, u64, usize);

impl<T: Into<String>> From<Vec<T>> for ActionValue {
    fn from(items: Vec<T>) -> Self {
        ActionValue::List(
            items
                .into_iter()
                .map(Into::into)
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> From<BTreeMap<K, V>> for ActionValue {
    fn from(map: BTreeMap<K, V>) -> Self {
        ActionValue::KeyValueSet(
            map.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// An AMI action: a set of named fields, one of which is `Action`.
///
/// Field names are normalized (trimmed, lowercased) on insert, so setting
/// `"Channel"` then `"channel"` keeps only the second value.
///
/// ```
/// use asterisk_ami_tokio::Action;
///
/// let originate = Action::new("Originate")
///     .field("Channel", "PJSIP/100")
///     .field("Exten", "200")
///     .field("Priority", 1)
///     .field("Variable", vec!["A=1", "B=2"]);
/// let wire = originate.to_wire_format("42").unwrap();
/// assert!(wire.starts_with("ActionID: 42\r\nAction: Originate\r\n"));
/// assert!(wire.contains("Variable: A=1,B=2\r\n"));
/// assert!(wire.ends_with("\r\n\r\n"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Action {
    fields: BTreeMap<String, ActionValue>,
}

impl Action {
    /// Start an action with the given `Action:` name.
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self::default().field(AmiHeader::Action.as_str(), name)
    }

    /// Build a `Login` action.
    pub fn login(username: &str, secret: &str, events: bool) -> Self {
        Action::new("Login")
            .field(AmiHeader::Username.as_str(), username)
            .field(AmiHeader::Secret.as_str(), secret)
            .field(AmiHeader::Events.as_str(), if events { "on" } else { "off" })
    }

    /// Add or replace a field. Empty names are ignored.
    pub fn field(mut self, name: &str, value: impl Into<ActionValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Add a field only when a value is present.
    pub fn field_opt<V: Into<ActionValue>>(mut self, name: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.set(name, value);
        }
        self
    }

    /// Request a specific correlation ID instead of a generated one.
    pub fn action_id(self, id: impl Into<String>) -> Self {
        let id: String = id.into();
        self.field(AmiHeader::ActionId.as_str(), id)
    }

    /// Add or replace a field in place.
    pub fn set(&mut self, name: &str, value: impl Into<ActionValue>) {
        let name = normalize_field_name(name);
        if name.is_empty() {
            return;
        }
        self.fields
            .insert(name, value.into());
    }

    /// Remove a field, returning its value if it existed.
    pub fn remove(&mut self, name: &str) -> Option<ActionValue> {
        self.fields
            .remove(&normalize_field_name(name))
    }

    /// Look up a field by name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&ActionValue> {
        self.fields
            .get(&normalize_field_name(name))
    }

    /// The `Action:` name, if set.
    pub fn name(&self) -> Option<String> {
        self.get(AmiHeader::Action.as_str())
            .map(ActionValue::render)
    }

    /// `true` for a `Login` action, which bypasses the authentication gate.
    pub fn is_login(&self) -> bool {
        self.name()
            .is_some_and(|n| n.eq_ignore_ascii_case("login"))
    }

    /// Strip the caller-supplied correlation ID from the payload.
    pub(crate) fn take_action_id(&mut self) -> Option<String> {
        self.remove(AmiHeader::ActionId.as_str())
            .map(|v| v.render())
            .filter(|id| !id.is_empty())
    }

    /// Render the action block for the wire.
    ///
    /// `ActionID` comes first, then every other field as `Name: value` with
    /// the name capitalized, sorted lexicographically, then a blank line.
    /// The `Action` value is capitalized too; other values go out verbatim.
    pub fn to_wire_format(&self, action_id: &str) -> AmiResult<String> {
        validate_no_newlines(action_id, "ActionID")?;

        let mut lines = Vec::with_capacity(self.fields.len());
        for (name, value) in &self.fields {
            if name == AmiHeader::ActionId.as_str() {
                continue;
            }
            let mut value = value.render();
            if name == AmiHeader::Action.as_str() {
                value = capitalize(&value);
            }
            validate_no_newlines(name, "field name")?;
            validate_no_newlines(&value, "field value")?;
            lines.push(format!("{}: {}", capitalize(name), value));
        }
        lines.sort();

        let mut wire = format!("{}: {}{}", HEADER_ACTION_ID, action_id, LINE_TERMINATOR);
        for line in lines {
            wire.push_str(&line);
            wire.push_str(LINE_TERMINATOR);
        }
        wire.push_str(LINE_TERMINATOR);
        Ok(wire)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.fields {
            if name == AmiHeader::Secret.as_str() {
                map.entry(name, &"[REDACTED]");
            } else {
                map.entry(name, &value.render());
            }
        }
        map.finish()
    }
}

impl TryFrom<serde_json::Value> for Action {
    type Error = AmiError;

    /// Build an action from a JSON object.
    ///
    /// `null` fields are dropped, arrays become [`ActionValue::List`], objects
    /// become [`ActionValue::KeyValueSet`], anything else a scalar.
    fn try_from(value: serde_json::Value) -> AmiResult<Self> {
        let serde_json::Value::Object(object) = value else {
            return Err(AmiError::InvalidAction(
                "action payload must be a JSON object".to_string(),
            ));
        };

        let mut action = Action::default();
        for (name, value) in object {
            let value = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::Array(items) => ActionValue::List(
                    items
                        .iter()
                        .map(json_scalar)
                        .collect(),
                ),
                serde_json::Value::Object(pairs) => ActionValue::KeyValueSet(
                    pairs
                        .iter()
                        .map(|(k, v)| (k.clone(), json_scalar(v)))
                        .collect(),
                ),
                other => ActionValue::Scalar(json_scalar(&other)),
            };
            action.set(&name, value);
        }
        Ok(action)
    }
}

fn json_scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars)
            .collect(),
        None => String::new(),
    }
}
