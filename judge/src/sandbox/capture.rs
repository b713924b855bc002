//! Print capture
//!
//! The only capability a script receives. Lines are appended to a buffer
//! owned by one run and handed back only if the run completes.

use super::error::ScriptError;

#[derive(Debug)]
pub struct OutputBuffer {
    text: String,
    limit: usize,
}

impl OutputBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            text: String::new(),
            limit,
        }
    }

    /// Append `line` followed by a newline
    pub fn push_line(&mut self, line: &str) -> Result<(), ScriptError> {
        if self.text.len() + line.len() + 1 > self.limit {
            return Err(ScriptError::OutputLimit(self.limit));
        }
        self.text.push_str(line);
        self.text.push('\n');
        Ok(())
    }

    pub fn into_string(self) -> String {
        self.text
    }
}
