//! Protocol constants and configuration values

/// Default Asterisk Manager Interface port
pub const DEFAULT_AMI_PORT: u16 = 5038;

/// Socket buffer size for reading from TCP stream (64KB)
pub const SOCKET_BUF_SIZE: usize = 65536;

/// Maximum size of a partial line carried between reads (1MB).
/// No legitimate AMI line comes close; exceeding it means the peer is not
/// speaking AMI.
pub const MAX_LINE_BUFFER_SIZE: usize = 1024 * 1024;

/// Maximum size of one item being assembled (8MB), follows bodies included.
/// Bounds memory when a follows block never sees its sentinel.
pub const MAX_ITEM_SIZE: usize = 8 * 1024 * 1024;

/// Outbound line terminator
pub const LINE_TERMINATOR: &str = "\r\n";

/// The banner Asterisk sends on connect, e.g. `Asterisk Call Manager/5.0.2`
pub const GREETING_PREFIX: &str = "Asterisk Call Manager";

/// Sentinel closing the body of a `Response: Follows` block
pub const END_COMMAND: &str = "--END COMMAND--";

/// Outbound correlation header, rendered ahead of every other field
pub const HEADER_ACTION_ID: &str = "ActionID";

/// Connection timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Delay before a keep-alive reconnect attempt, in milliseconds
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;
