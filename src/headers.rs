//! Typed field names and response statuses for AMI messages.

/// Error returned when parsing an unrecognized field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAmiHeaderError(pub String);

impl std::fmt::Display for ParseAmiHeaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown AMI header: {}", self.0)
    }
}

impl std::error::Error for ParseAmiHeaderError {}

define_header_enum! {
    error_type: ParseAmiHeaderError,
    /// Field names the client itself interprets.
    ///
    /// Inbound field names are lowercased by the parser, so the wire names
    /// here are lowercase and can be used directly with
    /// [`AmiMessage::get()`](crate::AmiMessage::get).
    pub enum AmiHeader {
        ActionId => "actionid",
        Action => "action",
        Response => "response",
        Message => "message",
        Event => "event",
        UserEvent => "userevent",
        Content => "content",
        Username => "username",
        Secret => "secret",
        Events => "events",
        Privilege => "privilege",
    }
}

/// Error returned when parsing an unrecognized `Response:` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResponseStatusError(pub String);

impl std::fmt::Display for ParseResponseStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown response status: {}", self.0)
    }
}

impl std::error::Error for ParseResponseStatusError {}

define_header_enum! {
    error_type: ParseResponseStatusError,
    /// Value of the `Response:` field.
    pub enum ResponseStatus {
        Success => "Success",
        Error => "Error",
        Follows => "Follows",
        Goodbye => "Goodbye",
    }
}
