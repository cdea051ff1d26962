use std::io::{self, Write};

use serde::Serialize;

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

/// Chooses between a human line and the serialized value on stdout.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    mode: OutputMode,
}

impl Output {
    pub fn new(json: bool) -> Self {
        let mode = if json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };
        Self { mode }
    }

    pub fn emit<T: Serialize>(&self, text: &str, value: &T) -> AppResult<()> {
        let stdout = io::stdout();
        self.write_to(&mut stdout.lock(), text, value)
    }

    pub fn write_to<W: Write, T: Serialize>(
        &self,
        writer: &mut W,
        text: &str,
        value: &T,
    ) -> AppResult<()> {
        match self.mode {
            OutputMode::Text => writeln!(writer, "{text}")?,
            OutputMode::Json => writeln!(writer, "{}", serde_json::to_string_pretty(value)?)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        sent: bool,
    }

    #[test]
    fn text_mode_writes_line() {
        let mut buf = Vec::new();
        Output::new(false)
            .write_to(&mut buf, "sent", &Sample { sent: true })
            .expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "sent\n");
    }

    #[test]
    fn json_mode_writes_value() {
        let mut buf = Vec::new();
        Output::new(true)
            .write_to(&mut buf, "sent", &Sample { sent: true })
            .expect("write");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(value["sent"], true);
    }
}
