//! Classification of inbound items into named channels

use crate::{headers::AmiHeader, message::AmiMessage};
use std::fmt;

/// A named stream of notifications that application code can subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Channel {
    /// The transport connected.
    Connect,
    /// The transport closed.
    Close,
    /// The server ended the stream (EOF).
    End,
    /// A transport-level error.
    Error,
    /// Every action response, correlated or not.
    Response,
    /// Every event.
    ManagerEvent,
    /// Items that are neither responses nor events.
    Unclassified,
    /// Events with the given name (lowercased).
    Event(String),
    /// `UserEvent` events with the given `UserEvent:` type (lowercased).
    UserEvent(String),
    /// The response to the action with this correlation ID.
    Action(String),
}

impl Channel {
    /// Channel for events named `name`, matched case-insensitively.
    pub fn event(name: &str) -> Self {
        Channel::Event(name.to_lowercase())
    }

    /// Channel for `UserEvent` events of type `kind`, matched case-insensitively.
    pub fn user_event(kind: &str) -> Self {
        Channel::UserEvent(kind.to_lowercase())
    }

    /// Channel carrying the response to one action.
    pub fn action(id: impl Into<String>) -> Self {
        Channel::Action(id.into())
    }

    /// Channel name as used on the wire-facing event surface.
    pub fn name(&self) -> String {
        match self {
            Channel::Connect => "connect".to_string(),
            Channel::Close => "close".to_string(),
            Channel::End => "end".to_string(),
            Channel::Error => "error".to_string(),
            Channel::Response => "response".to_string(),
            Channel::ManagerEvent => "managerevent".to_string(),
            Channel::Unclassified => "asterisk".to_string(),
            Channel::Event(name) => name.clone(),
            Channel::UserEvent(kind) => format!("userevent-{}", kind),
            Channel::Action(id) => id.clone(),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Where one inbound item must be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Complete the pending action `id`; `failed` when the response is an error.
    Reply { id: String, failed: bool },
    /// Publish on a subscription channel.
    Publish(Channel),
}

/// Decide where an item goes, in delivery order.
///
/// `last_action_id` is the most recently written action; bare follows
/// blocks carry no ActionID of their own and are attributed to it.
pub fn classify(item: &AmiMessage, last_action_id: Option<&str>) -> Vec<Route> {
    let mut routes = Vec::new();

    if let (Some(_), Some(id)) = (item.response(), item.action_id()) {
        routes.push(Route::Reply {
            id: id.to_string(),
            failed: item.is_error(),
        });
        routes.push(Route::Publish(Channel::Response));
    } else if let (Some(_), Some(_)) = (item.response(), item.content()) {
        if let Some(id) = last_action_id {
            routes.push(Route::Reply {
                id: id.to_string(),
                failed: false,
            });
        }
        routes.push(Route::Publish(Channel::Response));
    } else if let Some(event) = item.event() {
        routes.push(Route::Publish(Channel::ManagerEvent));
        routes.push(Route::Publish(Channel::event(event)));
        if event.eq_ignore_ascii_case(AmiHeader::UserEvent.as_str()) {
            if let Some(kind) = item.user_event() {
                routes.push(Route::Publish(Channel::user_event(kind)));
            }
        }
    } else {
        routes.push(Route::Publish(Channel::Unclassified));
    }

    routes
}
