//! # Input Editor
//!
//! Multi-line command entry with backslash continuation.
//!
//! ```text
//! $ cargo build \        ← echoed when Enter is pressed (printed = 1)
//! >   --release          ← echoed on the final Enter
//!
//! dispatched: "cargo build \n  --release"
//! ```
//!
//! Only the last line is ever edited. `printed` counts the leading lines
//! already echoed into the transcript, so no line is echoed twice.

use log::debug;

use crate::core::output::{OutputLog, OutputRecord};

/// Prompt shown before continuation lines.
pub const CONTINUATION_PROMPT: &str = ">";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEditor {
    lines: Vec<String>,
    printed: usize,
}

impl Default for InputEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl InputEditor {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            printed: 0,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn active_line(&self) -> &str {
        self.lines.last().map(String::as_str).unwrap_or_default()
    }

    /// Index of the line being edited; 0 means the first logical line.
    pub fn active_index(&self) -> usize {
        self.lines.len() - 1
    }

    pub fn printed_line_count(&self) -> usize {
        self.printed
    }

    fn active_mut(&mut self) -> &mut String {
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    /// Replaces the active line. Earlier lines are untouched.
    pub fn set_active_line(&mut self, text: impl Into<String>) {
        *self.active_mut() = text.into();
    }

    pub fn insert_char(&mut self, c: char) {
        self.active_mut().push(c);
    }

    pub fn backspace(&mut self) -> bool {
        self.active_mut().pop().is_some()
    }

    pub fn reset(&mut self) {
        self.lines = vec![String::new()];
        self.printed = 0;
    }

    /// Handles Enter.
    ///
    /// A line ending in `\` is echoed and a fresh line opened; `None` is
    /// returned because the command is not finished. Otherwise every line not
    /// yet echoed is flushed to `log`, the buffer resets and the joined
    /// command comes back for dispatch.
    pub fn submit(&mut self, first_prompt: &str, log: &mut OutputLog) -> Option<String> {
        if self.lines.len() == 1 && self.active_line().trim().is_empty() {
            return None;
        }

        let index = self.active_index();
        if is_continued(self.active_line()) {
            let record = OutputRecord::prefixed(prompt_for(index, first_prompt), self.active_line());
            log.append(record);
            self.printed += 1;
            self.lines.push(String::new());
            debug!("continuation: {} line(s) buffered", self.lines.len() - 1);
            return None;
        }

        for (i, line) in self.lines.iter().enumerate().skip(self.printed) {
            log.append(OutputRecord::prefixed(prompt_for(i, first_prompt), line.as_str()));
        }

        let command = self
            .lines
            .iter()
            .map(|line| strip_continuation(line))
            .collect::<Vec<_>>()
            .join("\n");

        self.reset();
        Some(command)
    }
}

/// Prompt for the logical line at `index`.
pub fn prompt_for(index: usize, first_prompt: &str) -> &str {
    if index == 0 {
        first_prompt
    } else {
        CONTINUATION_PROMPT
    }
}

fn is_continued(line: &str) -> bool {
    line.trim_end().ends_with('\\')
}

fn strip_continuation(line: &str) -> &str {
    line.trim_end().strip_suffix('\\').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(editor: &mut InputEditor, text: &str) {
        for c in text.chars() {
            editor.insert_char(c);
        }
    }

    #[test]
    fn test_new_editor_has_one_empty_line() {
        let editor = InputEditor::new();
        assert_eq!(editor.lines(), &[String::new()]);
        assert_eq!(editor.printed_line_count(), 0);
    }

    #[test]
    fn test_single_line_submit() {
        let mut editor = InputEditor::new();
        let mut log = OutputLog::new();
        type_str(&mut editor, "ls -la");

        let command = editor.submit("$", &mut log);

        assert_eq!(command.as_deref(), Some("ls -la"));
        assert_eq!(log.records(), &[OutputRecord::prefixed("$", "ls -la")]);
        assert_eq!(editor.active_line(), "");
    }

    #[test]
    fn test_continuation_then_final_line() {
        let mut editor = InputEditor::new();
        let mut log = OutputLog::new();

        type_str(&mut editor, "ab\\");
        assert_eq!(editor.submit("$", &mut log), None);
        assert_eq!(editor.printed_line_count(), 1);
        assert_eq!(editor.lines().len(), 2);

        type_str(&mut editor, "cd");
        let command = editor.submit("$", &mut log);

        assert_eq!(command.as_deref(), Some("ab\ncd"));
        assert_eq!(
            log.records(),
            &[
                OutputRecord::prefixed("$", "ab\\"),
                OutputRecord::prefixed(">", "cd"),
            ]
        );
        assert_eq!(editor.printed_line_count(), 0);
        assert_eq!(editor.lines(), &[String::new()]);
    }

    #[test]
    fn test_continuation_with_trailing_whitespace() {
        let mut editor = InputEditor::new();
        let mut log = OutputLog::new();

        type_str(&mut editor, "echo one \\  ");
        assert_eq!(editor.submit("$", &mut log), None);
        type_str(&mut editor, "two");

        assert_eq!(editor.submit("$", &mut log).as_deref(), Some("echo one \ntwo"));
    }

    #[test]
    fn test_each_line_echoed_once() {
        let mut editor = InputEditor::new();
        let mut log = OutputLog::new();

        for part in ["a \\", "b \\", "c"] {
            type_str(&mut editor, part);
            editor.submit("$", &mut log);
        }

        let echoed: Vec<_> = log.records().iter().map(|r| r.content.as_str()).collect();
        assert_eq!(echoed, vec!["a \\", "b \\", "c"]);
        let prefixes: Vec<_> = log.records().iter().map(|r| r.prefix.as_deref()).collect();
        assert_eq!(prefixes, vec![Some("$"), Some(">"), Some(">")]);
    }

    #[test]
    fn test_blank_submit_is_ignored() {
        let mut editor = InputEditor::new();
        let mut log = OutputLog::new();
        type_str(&mut editor, "   ");

        assert_eq!(editor.submit("$", &mut log), None);
        assert!(log.is_empty());
        assert_eq!(editor.printed_line_count(), 0);
    }

    #[test]
    fn test_edit_only_touches_active_line() {
        let mut editor = InputEditor::new();
        let mut log = OutputLog::new();
        type_str(&mut editor, "first \\");
        editor.submit("$", &mut log);

        editor.set_active_line("second");
        assert!(editor.backspace());
        assert_eq!(editor.lines(), &["first \\".to_string(), "secon".to_string()]);
    }

    #[test]
    fn test_first_prompt_comes_from_caller() {
        let mut editor = InputEditor::new();
        let mut log = OutputLog::new();
        type_str(&mut editor, "whoami");
        editor.submit("user@box:~$", &mut log);
        assert_eq!(log.records()[0].prefix.as_deref(), Some("user@box:~$"));
    }
}
