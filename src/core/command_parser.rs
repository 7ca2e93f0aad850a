//! Command parser: `target:channel:mode` → IdentifyRequest
//!
//! Every field is optional:
//! - "5"          → target=5, channel=0, mode=0
//! - "5:2"        → target=5, channel=2, mode=0
//! - "5:2:1"      → target=5, channel=2, mode=1
//! - "" / invalid → target=1, channel=0, mode=0 (safe defaults)

use crate::types::IdentifyRequest;
use crate::COMMAND_SEPARATOR;

/// Parser for the colon-encoded identify command
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a raw action payload. Never fails.
    pub fn parse(&self, raw: &str) -> IdentifyRequest {
        let mut req = IdentifyRequest::default();

        if raw.trim().is_empty() {
            return req;
        }

        let mut fields = raw.split(COMMAND_SEPARATOR);

        // A malformed field keeps its default without affecting its neighbours
        if let Some(id) = fields.next().and_then(parse_field) {
            req.target_id = id;
        }
        if let Some(ch) = fields.next().and_then(parse_field) {
            req.channel = ch;
        }
        if let Some(m) = fields.next().and_then(parse_field) {
            req.mode = m;
        }

        req
    }
}

/// Shorthand for `CommandParser::new().parse(raw)`
pub fn parse_command(raw: &str) -> IdentifyRequest {
    CommandParser.parse(raw)
}

fn parse_field(field: &str) -> Option<i32> {
    field.trim().parse().ok()
}

// =============================================================================
// TESTS
// =============================================================================
