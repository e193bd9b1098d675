//! AMI frame reader: bytes in, items out
//!
//! AMI is line oriented. An item is a run of `Name: Value` lines closed by a
//! blank line. Two irregular shapes ride on top of that:
//!
//! - a one-line banner (`Asterisk Call Manager/x.y.z`) sent right after connect,
//!   outside the block format;
//! - `Response: Follows` blocks, whose body is raw command output that may
//!   itself contain blank lines, closed by a `--END COMMAND--` sentinel line
//!   followed by a blank line.

use crate::{
    constants::{END_COMMAND, GREETING_PREFIX, MAX_ITEM_SIZE, MAX_LINE_BUFFER_SIZE},
    error::{AmiError, AmiResult},
    headers::AmiHeader,
    message::{normalize_field_name, AmiMessage},
};
use regex::Regex;
use std::sync::OnceLock;

fn follows_action_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)actionid: ([^\r\n]+)").expect("follows ActionID pattern is valid")
    })
}

/// Progress through a `Response: Follows` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowState {
    /// Not inside a follows block.
    #[default]
    None,
    /// Saw `Response: Follows`, reading command output.
    InFollow,
    /// Saw the `--END COMMAND--` sentinel, waiting for the closing blank line.
    FollowEnded,
}

/// Streaming AMI parser.
///
/// Feed it socket reads of any size; it returns the items completed by each
/// read. Items split across reads are carried over, so the sequence of items
/// produced does not depend on where the stream was cut.
#[derive(Debug, Default)]
pub struct AmiParser {
    /// Bytes after the last line terminator. Never holds a full line.
    line_buffer: Vec<u8>,
    /// Lines of the item being assembled.
    lines: Vec<String>,
    /// Bytes held in `lines`.
    item_size: usize,
    follow: FollowState,
    /// The banner may only appear as the very first line of a session.
    first_line_seen: bool,
    greeting: Option<String>,
}

impl AmiParser {
    /// Create a parser for a fresh session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current follows-block state.
    pub fn follow_state(&self) -> FollowState {
        self.follow
    }

    /// Banner line, if the session opened with one.
    pub fn greeting(&self) -> Option<&str> {
        self.greeting
            .as_deref()
    }

    /// Append a chunk and return every item it completes, in arrival order.
    pub fn feed(&mut self, data: &[u8]) -> AmiResult<Vec<AmiMessage>> {
        self.line_buffer
            .extend_from_slice(data);

        let mut items = Vec::new();
        let mut start = 0;
        while let Some(pos) = self.line_buffer[start..]
            .iter()
            .position(|&b| b == b'\n')
        {
            let end = start + pos;
            let mut raw = &self.line_buffer[start..end];
            if let [head @ .., b'\r'] = raw {
                raw = head;
            }
            let line = String::from_utf8_lossy(raw).into_owned();
            start = end + 1;
            if let Some(item) = self.process_line(line) {
                items.push(item);
            }
            if self.item_size > MAX_ITEM_SIZE {
                return Err(AmiError::protocol_error(format!(
                    "Item exceeds {} bytes without a terminator",
                    MAX_ITEM_SIZE
                )));
            }
        }
        self.line_buffer
            .drain(..start);

        if self
            .line_buffer
            .len()
            > MAX_LINE_BUFFER_SIZE
        {
            return Err(AmiError::protocol_error(format!(
                "Line exceeds {} bytes without a terminator",
                MAX_LINE_BUFFER_SIZE
            )));
        }

        Ok(items)
    }

    fn process_line(&mut self, line: String) -> Option<AmiMessage> {
        let first_line = !self.first_line_seen;
        self.first_line_seen = true;

        if first_line && self.lines.is_empty() && line.starts_with(GREETING_PREFIX) {
            self.greeting = Some(line);
            return None;
        }

        if self.lines.is_empty() && starts_follows(&line) {
            self.follow = FollowState::InFollow;
            self.push_line(line);
            return None;
        }

        match self.follow {
            FollowState::InFollow if line == END_COMMAND => {
                self.follow = FollowState::FollowEnded;
                self.push_line(line);
                None
            }
            FollowState::FollowEnded if line.is_empty() => {
                self.follow = FollowState::None;
                Some(self.finish_follows())
            }
            FollowState::None if line.is_empty() => Some(self.finish_item()),
            _ => {
                self.push_line(line);
                None
            }
        }
    }

    fn push_line(&mut self, line: String) {
        self.item_size += line.len() + 1;
        self.lines.push(line);
    }

    fn take_lines(&mut self) -> Vec<String> {
        self.item_size = 0;
        std::mem::take(&mut self.lines)
    }

    fn finish_follows(&mut self) -> AmiMessage {
        let mut lines = self.take_lines();
        lines.pop();
        let content = lines.join("\n");

        let mut item = AmiMessage::new();
        item.insert(AmiHeader::Response.as_str(), "follows");
        if let Some(caps) = follows_action_id().captures(&content) {
            item.insert(AmiHeader::ActionId.as_str(), &caps[1]);
        }
        item.insert(AmiHeader::Content.as_str(), content);
        item
    }

    fn finish_item(&mut self) -> AmiMessage {
        self.take_lines()
            .into_iter()
            .filter(|line| !line.is_empty())
            .map(|line| split_field(&line))
            .collect()
    }
}

/// `Response:` (any case) whose line mentions "follow".
fn starts_follows(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.starts_with("response:") && lower.contains("follow")
}

/// Split on the first colon. A line without one becomes a field with an
/// empty value.
fn split_field(line: &str) -> (String, String) {
    match line.split_once(':') {
        Some((name, value)) => (
            normalize_field_name(name),
            value
                .trim()
                .to_string(),
        ),
        None => (normalize_field_name(line), String::new()),
    }
}
