//! # Line Framer
//!
//! Turns raw text chunks into complete transcript lines.
//!
//! ```text
//! "\r\n"  → ends the buffered line
//! "\n"    → ends the buffered line
//! "\r"    → throws the buffered line away (carriage-return overwrite)
//! other   → appended to the buffer
//! ```
//!
//! The buffer survives across calls, so a terminator split over two chunks
//! frames exactly like the unsplit text. Whatever is left at the end of a
//! chunk is not a line yet: it is the remote prompt until a terminator
//! arrives or the session ends.

/// Stateful splitter shared by the socket transcript and the chunked POST reader.
#[derive(Debug, Default, Clone)]
pub struct LineFramer {
    buffer: String,
    /// A `\r` was the last character seen. It only means "overwrite" once we
    /// know the next character is not `\n`.
    pending_cr: bool,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns every line it completed, in order.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        let mut lines = Vec::new();

        for c in chunk.chars() {
            if self.pending_cr {
                self.pending_cr = false;
                if c == '\n' {
                    lines.push(std::mem::take(&mut self.buffer));
                    continue;
                }
                self.buffer.clear();
            }

            match c {
                '\r' => self.pending_cr = true,
                '\n' => lines.push(std::mem::take(&mut self.buffer)),
                other => self.buffer.push(other),
            }
        }

        lines
    }

    /// The unterminated fragment carried into the next chunk.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Ends the stream. A trailing lone `\r` still overwrites; any fragment
    /// left after that is returned as a final line.
    pub fn finish(&mut self) -> Option<String> {
        if std::mem::take(&mut self.pending_cr) {
            self.buffer.clear();
        }
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.pending_cr = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_all(chunks: &[&str]) -> (Vec<String>, String) {
        let mut framer = LineFramer::new();
        let mut lines = Vec::new();
        for chunk in chunks {
            lines.extend(framer.push(chunk));
        }
        (lines, framer.pending().to_string())
    }

    #[test]
    fn test_lf_and_crlf_terminate_lines() {
        let (lines, pending) = frame_all(&["one\ntwo\r\nthree\n"]);
        assert_eq!(lines, vec!["one", "two", "three"]);
        assert_eq!(pending, "");
    }

    #[test]
    fn test_lone_cr_discards_buffered_text() {
        let (lines, _) = frame_all(&["progress 10%\rprogress 100%\n"]);
        assert_eq!(lines, vec!["progress 100%"]);
    }

    #[test]
    fn test_trailing_fragment_becomes_pending() {
        let (lines, pending) = frame_all(&["total 0\nuser@host:~$ "]);
        assert_eq!(lines, vec!["total 0"]);
        assert_eq!(pending, "user@host:~$ ");
    }

    #[test]
    fn test_pending_fragment_joins_next_chunk() {
        let (lines, pending) = frame_all(&["hel", "lo\nwor", "ld"]);
        assert_eq!(lines, vec!["hello"]);
        assert_eq!(pending, "world");
    }

    #[test]
    fn test_crlf_split_across_chunks_is_one_terminator() {
        let (lines, pending) = frame_all(&["abc\r", "\ndef\n"]);
        assert_eq!(lines, vec!["abc", "def"]);
        assert_eq!(pending, "");
    }

    #[test]
    fn test_empty_lines_are_preserved() {
        let (lines, _) = frame_all(&["\n\r\n\n"]);
        assert_eq!(lines, vec!["", "", ""]);
    }

    #[test]
    fn test_split_invariance_over_every_split_point() {
        let inputs = [
            "a\r\nb\nc\rd\n",
            "\r\r\n\n\rx\r\ny",
            "prompt> \rover\r\nwrite\n\r",
            "ü\r\nnaïve\rcafé\n",
        ];

        for input in inputs {
            let (whole, whole_pending) = frame_all(&[input]);

            let boundaries: Vec<usize> = input.char_indices().map(|(i, _)| i).skip(1).collect();
            for split in boundaries {
                let (left, right) = input.split_at(split);
                let (lines, pending) = frame_all(&[left, right]);
                assert_eq!(lines, whole, "split at {split} of {input:?}");
                assert_eq!(pending, whole_pending, "split at {split} of {input:?}");
            }

            let chars: Vec<String> = input.chars().map(String::from).collect();
            let pieces: Vec<&str> = chars.iter().map(String::as_str).collect();
            let (lines, pending) = frame_all(&pieces);
            assert_eq!(lines, whole, "char by char {input:?}");
            assert_eq!(pending, whole_pending);
        }
    }

    #[test]
    fn test_finish_flushes_fragment() {
        let mut framer = LineFramer::new();
        framer.push("done\nlast words");
        assert_eq!(framer.finish(), Some("last words".to_string()));
        assert_eq!(framer.pending(), "");
        assert_eq!(framer.finish(), None);
    }

    #[test]
    fn test_finish_applies_trailing_cr() {
        let mut framer = LineFramer::new();
        framer.push("spinner\r");
        assert_eq!(framer.finish(), None);
    }

    #[test]
    fn test_reset_drops_state() {
        let mut framer = LineFramer::new();
        framer.push("abc\r");
        framer.reset();
        assert_eq!(framer.push("\n"), vec![""]);
    }
}
