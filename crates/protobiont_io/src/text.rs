//! Whitespace token scanning and record writing.
//!
//! The save format is a stream of whitespace-delimited tokens; line breaks
//! are cosmetic. The scanner pulls the whole input into memory up front,
//! which keeps error reporting simple and is cheap at the population sizes
//! this engine runs.

use std::io::{Read, Write};

use crate::error::{IoError, Result};

/// Pull-based reader over the whitespace tokens of a text stream.
pub struct TokenScanner {
    tokens: Vec<String>,
    cursor: usize,
}

impl TokenScanner {
    pub fn new<R: Read>(mut reader: R) -> Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Ok(Self {
            tokens: content.split_whitespace().map(str::to_owned).collect(),
            cursor: 0,
        })
    }

    /// Next raw token. Running out of input is a parse error, not an EOF
    /// condition: every record announces its length up front.
    pub fn next_token(&mut self) -> Result<&str> {
        let token = self
            .tokens
            .get(self.cursor)
            .ok_or_else(|| IoError::parse("unexpected end of input"))?;
        self.cursor += 1;
        Ok(token)
    }

    pub fn next_i64(&mut self) -> Result<i64> {
        let token = self.next_token()?;
        token
            .parse()
            .map_err(|_| IoError::parse(format!("expected integer, got \"{token}\"")))
    }

    pub fn next_i32(&mut self) -> Result<i32> {
        let token = self.next_token()?;
        token
            .parse()
            .map_err(|_| IoError::parse(format!("expected integer, got \"{token}\"")))
    }

    pub fn next_u64(&mut self) -> Result<u64> {
        let token = self.next_token()?;
        token
            .parse()
            .map_err(|_| IoError::parse(format!("expected unsigned integer, got \"{token}\"")))
    }

    pub fn next_usize(&mut self) -> Result<usize> {
        let token = self.next_token()?;
        token
            .parse()
            .map_err(|_| IoError::parse(format!("expected count, got \"{token}\"")))
    }

    pub fn next_f32(&mut self) -> Result<f32> {
        let token = self.next_token()?;
        token
            .parse()
            .map_err(|_| IoError::parse(format!("expected number, got \"{token}\"")))
    }

    /// Flag token: 1 is true, 0 is false, anything else is malformed.
    pub fn next_flag(&mut self) -> Result<bool> {
        match self.next_i64()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(IoError::parse(format!("expected 0 or 1, got {other}"))),
        }
    }

    /// Whether every token has been consumed.
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.cursor >= self.tokens.len()
    }
}

/// Writes fields as space-separated tokens, one logical record per line.
pub struct RecordWriter<W: Write> {
    writer: W,
    line_started: bool,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            line_started: false,
        }
    }

    pub fn field(&mut self, token: impl std::fmt::Display) -> Result<()> {
        if self.line_started {
            write!(self.writer, " ")?;
        }
        write!(self.writer, "{token}")?;
        self.line_started = true;
        Ok(())
    }

    pub fn flag(&mut self, value: bool) -> Result<()> {
        self.field(if value { 1 } else { 0 })
    }

    pub fn end_record(&mut self) -> Result<()> {
        writeln!(self.writer)?;
        self.line_started = false;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
