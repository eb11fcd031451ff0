//! # Output Log
//!
//! The transcript: everything the terminal has displayed, in order.
//! Records are never edited after they are appended; the only other
//! operation is a full reset (the `clear` built-in).

use std::fmt;

/// One transcript line, optionally led by the prompt it was typed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub prefix: Option<String>,
    pub content: String,
}

impl OutputRecord {
    /// A record with no prefix (remote output, status lines).
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            prefix: None,
            content: content.into(),
        }
    }

    /// An echoed input line shown after its prompt.
    pub fn prefixed(prefix: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            content: content.into(),
        }
    }
}

impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix.as_deref() {
            Some(prefix) if prefix.ends_with(char::is_whitespace) => {
                write!(f, "{prefix}{}", self.content)
            }
            Some(prefix) if !prefix.is_empty() => write!(f, "{prefix} {}", self.content),
            _ => write!(f, "{}", self.content),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct OutputLog {
    records: Vec<OutputRecord>,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: OutputRecord) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn records(&self) -> &[OutputRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&OutputRecord> {
        self.records.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_order() {
        let mut log = OutputLog::new();
        log.append(OutputRecord::prefixed("$", "ls"));
        log.append(OutputRecord::plain("Cargo.toml"));

        assert_eq!(log.len(), 2);
        assert_eq!(log.records()[0].prefix.as_deref(), Some("$"));
        assert_eq!(log.last(), Some(&OutputRecord::plain("Cargo.toml")));
    }

    #[test]
    fn test_clear_empties_log() {
        let mut log = OutputLog::new();
        log.append(OutputRecord::plain("hello"));
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_display_joins_prefix_and_content() {
        assert_eq!(OutputRecord::prefixed("$", "pwd").to_string(), "$ pwd");
        assert_eq!(OutputRecord::prefixed("", "pwd").to_string(), "pwd");
        // Remote prompts usually carry their own trailing space.
        assert_eq!(OutputRecord::prefixed("host$ ", "id").to_string(), "host$ id");
        assert_eq!(OutputRecord::plain("/home").to_string(), "/home");
    }
}
