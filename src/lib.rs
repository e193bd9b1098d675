//! Asterisk Manager Interface (AMI) client for Rust
//!
//! This crate provides an async client for Asterisk's line-oriented manager
//! protocol: log in, send actions, receive their correlated responses and
//! subscribe to the events the server pushes.
//!
//! # Architecture
//!
//! [`AmiClient`] (Clone + Send) owns one session. Behind it:
//! - a reader task turns the byte stream into [`AmiMessage`]s
//!   ([`AmiParser`]), classifies each one and delivers it, either to the
//!   [`PendingAction`] it answers or to [`Subscription`]s on a [`Channel`];
//! - a writer task drains queued actions into the socket.
//!
//! Until [`login`](AmiClient::login) succeeds, every action other than
//! `Login` is held and then sent in submission order.
//!
//! # Examples
//!
//! ## Actions
//!
//! ```rust,no_run
//! use asterisk_ami_tokio::{Action, AmiClient, AmiError, LoginCredentials, DEFAULT_AMI_PORT};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AmiError> {
//!     let client = AmiClient::new();
//!     client.connect("localhost", DEFAULT_AMI_PORT).await?;
//!     client.login(&LoginCredentials::new("admin", "secret")).await?;
//!
//!     let uptime = client
//!         .action(Action::new("Command").field("Command", "core show uptime"))
//!         .await?;
//!     println!("{}", uptime.content().unwrap_or(""));
//!
//!     client.disconnect().await
//! }
//! ```
//!
//! Actions may be sent before login; they are held and released once the
//! session is authenticated:
//!
//! ```rust,no_run
//! # async fn example(client: &asterisk_ami_tokio::AmiClient) -> Result<(), asterisk_ami_tokio::AmiError> {
//! use asterisk_ami_tokio::{Action, LoginCredentials};
//!
//! let pending = client.dispatch(Action::new("CoreStatus"));
//! println!("queued as {}", pending.id());
//! client.login(&LoginCredentials::new("admin", "secret")).await?;
//! let status = pending.await?;
//! println!("{}", status);
//! # Ok(())
//! # }
//! ```
//!
//! ## Events
//!
//! ```rust,no_run
//! use asterisk_ami_tokio::{AmiClient, Channel, LoginCredentials, DEFAULT_AMI_PORT};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AmiClient::new();
//!     let mut hangups = client.subscribe(Channel::event("Hangup"));
//!     client.keep_connected(
//!         "localhost",
//!         DEFAULT_AMI_PORT,
//!         LoginCredentials::new("admin", "secret"),
//!         None,
//!     );
//!
//!     while let Some(event) = hangups.recv_message().await {
//!         println!("hangup on {}", event.get("Channel").unwrap_or("?"));
//!     }
//!     Ok(())
//! }
//! ```

#[macro_use]
mod macros;

pub mod command;
pub mod connection;
pub mod constants;
pub mod error;
pub mod headers;
pub mod message;
pub mod protocol;
pub mod registry;
pub mod router;

pub(crate) mod correlation;

pub use command::{Action, ActionValue};
pub use connection::{AmiClient, AmiConnectOptions, ConnectionStatus, LoginCredentials};
pub use constants::DEFAULT_AMI_PORT;
pub use correlation::PendingAction;
pub use error::{AmiError, AmiResult};
pub use headers::{AmiHeader, ResponseStatus};
pub use message::AmiMessage;
pub use protocol::{AmiParser, FollowState};
pub use registry::{Notification, Subscription};
pub use router::{classify, Channel, Route};
