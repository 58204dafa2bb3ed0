//! Loads LS-8 programs written as one binary literal per line:
//!
//! ```text
//! # print8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```

use std::borrow::Cow;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;
use std::{fmt, fs, str::Lines};

use crate::error::LoadError;

use super::{Byte, Memory, MEMORY_SIZE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidNumber { token: String },
    ProgramTooLarge,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidNumber { token } => {
                write!(f, "invalid number `{}`", token)
            }
            ParseErrorKind::ProgramTooLarge => {
                write!(f, "program does not fit into {} bytes of memory", MEMORY_SIZE)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: ParseErrorKind,
    context: Option<Cow<'static, str>>,
    line_nr: usize,
}

impl ParseError {
    fn new<C, S>(kind: ParseErrorKind, context: C, line_nr: usize) -> Self
    where
        C: Into<Option<S>>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            kind,
            context: context.into().map(|inner| inner.into()),
            line_nr,
        }
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// The 1-based line the error was found on
    pub fn line_nr(&self) -> usize {
        self.line_nr
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(
                f,
                "error [ln: {}]: {} - {}",
                self.line_nr, self.kind, context
            )
        } else {
            write!(f, "error [ln: {}]: {}", self.line_nr, self.kind)
        }
    }
}

impl std::error::Error for ParseError {}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lines: Lines<'a>,
    line_nr: usize,
    position: usize,
    memory: Memory,
    exhausted: bool,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for `data` which will try to populate `memory`
    /// starting at address 0.
    pub fn new(data: &'a str, memory: Memory) -> Self {
        Self {
            lines: data.lines(),
            line_nr: 0,
            position: 0,
            memory,
            exhausted: false,
        }
    }

    /// Consumes `self` and tries to parse all lines into memory.
    ///
    /// # Errors
    ///
    /// All errors which may occur are collected and returned at the end.
    /// Parsing stops at the first line that no longer fits into memory.
    pub fn parse(mut self) -> Result<Memory, Vec<ParseError>> {
        let mut errors = Vec::new();

        while let Some(res) = self.parse_next_line() {
            if let Err(err) = res {
                log::error!("{}", err);
                errors.push(err);
            }
        }

        if errors.is_empty() {
            log::debug!("Loaded {} bytes", self.position);
            Ok(self.memory)
        } else {
            Err(errors)
        }
    }

    /// Tries to parse the next line. Each instruction byte should be
    /// located on it's own line.
    fn parse_next_line(&mut self) -> Option<Result<()>> {
        if self.exhausted {
            return None;
        }

        let line = self.lines.next()?.trim();
        self.line_nr += 1;

        match line.split_whitespace().next() {
            // Comment or empty line; skip
            None => Some(Ok(())),
            Some(token) if token.starts_with('#') => Some(Ok(())),
            Some(token) => Some(self.parse_byte(token)),
        }
    }

    /// Tries to parse `token` as a base-2 byte literal and write it to the
    /// next free address.
    ///
    /// # Examples
    ///
    /// - `10000010`
    /// - `00000001`
    fn parse_byte(&mut self, token: &str) -> Result<()> {
        let byte = Byte::from_str_radix(token, 2).map_err(|err| {
            ParseError::new(
                ParseErrorKind::InvalidNumber {
                    token: token.to_owned(),
                },
                err.to_string(),
                self.line_nr,
            )
        })?;

        self.write_byte(byte)
    }

    /// Writes `byte` into memory at the current position, then advances it
    /// by one.
    ///
    /// # Errors
    ///
    /// This will return an error if memory is already full.
    fn write_byte(&mut self, byte: Byte) -> Result<()> {
        if self.position >= MEMORY_SIZE {
            self.exhausted = true;
            return Err(ParseError::new(
                ParseErrorKind::ProgramTooLarge,
                format!("byte {} of the program", MEMORY_SIZE + 1),
                self.line_nr,
            ));
        }

        self.memory.data[self.position] = byte;
        self.position += 1;
        Ok(())
    }
}

impl FromStr for Memory {
    type Err = LoadError;

    fn from_str(data: &str) -> std::result::Result<Self, Self::Err> {
        Parser::new(data, Memory::default())
            .parse()
            .map_err(LoadError::Parse)
    }
}

impl Memory {
    /// Reads the program at `path` and loads it into a fresh memory
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::result::Result<Self, LoadError> {
        let path = path.as_ref();
        log::debug!("Loading program from {}", path.display());

        let data = fs::read_to_string(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => LoadError::NotFound {
                path: path.to_path_buf(),
            },
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        data.parse()
    }
}
