//! Backtracking cursor for the MQO grammar.
//!
//! Every production is a function `fn(&mut Cursor) -> PResult<T>`. A
//! production that does not match returns [`Fail::Backtrack`]; the caller
//! restores the position through [`Cursor::attempt`] and tries the next
//! alternative. Semantic failures found mid-grammar use [`Fail::Fatal`] and
//! abort the whole parse.
//!
//! The cursor remembers the furthest offset at which any production failed,
//! which is where a final parse error is reported.

use std::str::FromStr;

use crate::error::MqoError;

/// Why a production did not produce a value.
#[derive(Debug)]
pub enum Fail {
    /// No match here; try something else.
    Backtrack,
    /// Stop parsing and report this error.
    Fatal(MqoError),
}

impl From<MqoError> for Fail {
    fn from(err: MqoError) -> Self {
        Fail::Fatal(err)
    }
}

pub type PResult<T> = std::result::Result<T, Fail>;

/// A production that can be passed around as an alternative.
pub type Production<T> = for<'a> fn(&mut Cursor<'a>) -> PResult<T>;

/// Position in the decoded document.
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    /// Lines that precede `input` in the original document.
    line_offset: usize,
    furthest: usize,
    expected: Vec<&'static str>,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_line_offset(input, 0)
    }

    pub fn with_line_offset(input: &'a str, line_offset: usize) -> Self {
        Self {
            input,
            pos: 0,
            line_offset,
            furthest: 0,
            expected: Vec::new(),
        }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Record a failed expectation at the current position and backtrack.
    pub fn fail<T>(&mut self, expected: &'static str) -> PResult<T> {
        if self.pos > self.furthest {
            self.furthest = self.pos;
            self.expected.clear();
        }
        if self.pos == self.furthest && !self.expected.contains(&expected) {
            self.expected.push(expected);
        }
        Err(Fail::Backtrack)
    }

    /// Run `f`, rewinding to the starting position if it backtracks.
    pub fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        let start = self.pos;
        let result = f(self);
        if matches!(result, Err(Fail::Backtrack)) {
            self.pos = start;
        }
        result
    }

    /// Like [`Cursor::attempt`], but a backtrack becomes `Ok(None)`.
    pub fn optional<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<Option<T>> {
        match self.attempt(f) {
            Ok(value) => Ok(Some(value)),
            Err(Fail::Backtrack) => Ok(None),
            Err(fatal) => Err(fatal),
        }
    }

    /// Apply `f` until it backtracks or stops consuming input.
    pub fn many<T>(&mut self, mut f: impl FnMut(&mut Self) -> PResult<T>) -> PResult<Vec<T>> {
        let mut items = Vec::new();
        loop {
            let start = self.pos;
            match self.optional(&mut f)? {
                Some(item) => items.push(item),
                None => break,
            }
            if self.pos == start {
                break;
            }
        }
        Ok(items)
    }

    /// Try each production in order; the first one that matches wins.
    pub fn one_of<T>(&mut self, alternatives: &[Production<T>]) -> PResult<T> {
        for alternative in alternatives {
            match self.attempt(|c| alternative(c)) {
                Err(Fail::Backtrack) => continue,
                result => return result,
            }
        }
        Err(Fail::Backtrack)
    }

    /// Skip any whitespace, line breaks included.
    pub fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    /// Skip horizontal whitespace (spaces and tabs).
    pub fn separator(&mut self) {
        let skipped = self
            .rest()
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        self.pos += skipped;
    }

    /// Match `text` exactly.
    pub fn literal(&mut self, text: &'static str) -> PResult<()> {
        if self.rest().starts_with(text) {
            self.pos += text.len();
            Ok(())
        } else {
            self.fail(text)
        }
    }

    /// Match the ASCII `keyword` ignoring case.
    pub fn keyword(&mut self, keyword: &'static str) -> PResult<()> {
        let rest = self.rest().as_bytes();
        if rest.len() >= keyword.len()
            && rest[..keyword.len()].eq_ignore_ascii_case(keyword.as_bytes())
        {
            self.pos += keyword.len();
            Ok(())
        } else {
            self.fail(keyword)
        }
    }

    /// Match a CRLF line terminator.
    pub fn line_end(&mut self) -> PResult<()> {
        self.literal("\r\n")
    }

    /// Consume everything up to and including the next CRLF.
    pub fn rest_of_line(&mut self) -> PResult<&'a str> {
        let rest = self.rest();
        let len = rest.find(['\r', '\n']).unwrap_or(rest.len());
        self.pos += len;
        self.line_end()?;
        Ok(&rest[..len])
    }

    /// Consume the longest run of characters accepted by `pred`.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|ch: char| !pred(ch)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// `[+-]?[0-9]+`
    pub fn integer(&mut self) -> PResult<i64> {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let mut len = 0;
        if matches!(bytes.first(), Some(b'+' | b'-')) {
            len += 1;
        }
        let digits = count_digits(&bytes[len..]);
        if digits == 0 {
            return self.fail("integer");
        }
        len += digits;

        match rest[..len].parse::<i64>() {
            Ok(value) => {
                self.pos += len;
                Ok(value)
            }
            Err(_) => self.fail("integer"),
        }
    }

    /// `[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?`, read as `f32` or `f64`.
    pub fn decimal<T: FromStr>(&mut self) -> PResult<T> {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let mut len = 0;
        if matches!(bytes.first(), Some(b'+' | b'-')) {
            len += 1;
        }
        let int_digits = count_digits(&bytes[len..]);
        len += int_digits;
        let mut frac_digits = 0;
        if bytes.get(len) == Some(&b'.') {
            frac_digits = count_digits(&bytes[len + 1..]);
            if int_digits > 0 || frac_digits > 0 {
                len += 1 + frac_digits;
            }
        }
        if int_digits == 0 && frac_digits == 0 {
            return self.fail("number");
        }
        if matches!(bytes.get(len), Some(b'e' | b'E')) {
            let mut exp_len = 1;
            if matches!(bytes.get(len + 1), Some(b'+' | b'-')) {
                exp_len += 1;
            }
            let exp_digits = count_digits(&bytes[(len + exp_len).min(bytes.len())..]);
            if exp_digits > 0 {
                len += exp_len + exp_digits;
            }
        }

        match rest[..len].parse::<T>() {
            Ok(value) => {
                self.pos += len;
                Ok(value)
            }
            Err(_) => self.fail("number"),
        }
    }

    /// A double-quoted string on a single line; `\"` and `\\` are unescaped.
    pub fn quoted_string(&mut self) -> PResult<String> {
        let start = self.pos;
        self.literal("\"")?;
        let mut value = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((offset, ch)) = chars.next() {
            match ch {
                '"' => {
                    self.pos += offset + 1;
                    return Ok(value);
                }
                '\\' => match chars.next() {
                    Some((_, escaped @ ('"' | '\\'))) => value.push(escaped),
                    Some((_, '\r' | '\n')) | None => break,
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                },
                '\r' | '\n' => break,
                other => value.push(other),
            }
        }
        self.pos = start;
        self.fail("closing quote")
    }

    /// 1-based (line, column) of a byte offset, counted in the whole document.
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let before = &self.input[..offset.min(self.input.len())];
        let line = before.matches('\n').count() + 1 + self.line_offset;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        (line, column)
    }

    /// Parser error at the furthest point any production reached.
    pub fn furthest_error(&self) -> MqoError {
        let offset = self.furthest.max(self.pos);
        let (line, column) = self.line_column(offset);
        let found = self.input[offset.min(self.input.len())..]
            .chars()
            .next()
            .map_or_else(|| "end of input".to_string(), |ch| format!("{ch:?}"));
        let reason = if self.expected.is_empty() || offset != self.furthest {
            format!("unexpected {found}")
        } else {
            let expected: Vec<String> = self.expected.iter().map(|e| format!("{e:?}")).collect();
            format!("expected {}, found {found}", expected.join(" or "))
        };
        MqoError::Parser {
            reason,
            line,
            column,
        }
    }
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}
