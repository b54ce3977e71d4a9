use std::fmt;

use crate::command::Command;
use crate::error::StompError;
use crate::header::{HeaderName, Headers};

const NEWLINE: u8 = b'\n';
const SEPARATOR: u8 = b':';
const NUL: u8 = b'\0';

/// A validated STOMP frame.
///
/// A `Frame` is only obtainable from [`Frame::parse`] or [`Frame::new`], both
/// of which run the full validator, or from [`Frame::default`], which is the
/// zero value (`Unknown` command, no headers, empty body) callers can fall
/// back to with `unwrap_or_default()`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    command: Command,
    headers: Headers,
    body: Vec<u8>,
}

impl Frame {
    /// Build a frame from parts. The parts are rendered to wire bytes and
    /// parsed back, so the result is exactly what a peer would decode.
    ///
    /// # Errors
    ///
    /// [`StompError::HeaderNoSeparator`] when a header value contains a
    /// newline, otherwise the [`StompError`] the parser reports for the
    /// rendered bytes.
    pub fn new(command: Command, headers: &Headers, body: &[u8]) -> Result<Self, StompError> {
        Self::parse(&render(command, headers, body)?)
    }

    /// Parse and validate one wire frame.
    ///
    /// Header values that are not valid UTF-8 are kept with the offending
    /// bytes replaced by U+FFFD, so [`Frame::to_bytes`] then differs from
    /// the input.
    ///
    /// # Errors
    ///
    /// Returns the first problem found in scan order: command line, header
    /// lines, body delimiting, trailing bytes, then per-command validation.
    pub fn parse(bytes: &[u8]) -> Result<Self, StompError> {
        let command_end = find(bytes, 0, NEWLINE).ok_or(StompError::HeaderEmpty)?;
        let command = Command::from_wire(&bytes[..command_end]);
        if command == Command::Unknown {
            return Err(StompError::CommandInvalid);
        }

        let mut headers = Headers::new();
        let mut cursor = command_end + 1;
        while cursor < bytes.len() && bytes[cursor] != NEWLINE {
            let line_end = find(bytes, cursor, NEWLINE).ok_or(StompError::HeaderMissingNewLine)?;
            let line = &bytes[cursor..line_end];

            let split = line
                .iter()
                .position(|&byte| byte == SEPARATOR)
                .ok_or(StompError::HeaderNoSeparator)?;
            let name = HeaderName::from_wire(&line[..split]);
            if name == HeaderName::Unknown {
                return Err(StompError::HeaderInvalidKey);
            }
            let value = &line[split + 1..];
            if value.is_empty() {
                return Err(StompError::HeaderEmptyValue);
            }

            headers
                .entry(name)
                .or_insert_with(|| String::from_utf8_lossy(value).into_owned());
            cursor = line_end + 1;
        }
        if cursor >= bytes.len() {
            return Err(StompError::BodyNoNewLine);
        }

        let body_start = cursor + 1;
        let remaining = bytes.len() - body_start;
        let body_end = match headers.get(&HeaderName::ContentLength) {
            Some(declared) => {
                let declared = content_length(declared)?;
                if declared == remaining {
                    return Err(StompError::BodyMissingNull);
                }
                if declared > remaining {
                    return Err(StompError::BodyLength);
                }
                let end = body_start + declared;
                if bytes[end] != NUL {
                    return Err(StompError::BodyMissingNull);
                }
                end
            }
            None => find(bytes, body_start, NUL).ok_or(StompError::BodyMissingNull)?,
        };

        if bytes[body_end + 1..].iter().any(|&byte| byte != NEWLINE) {
            return Err(StompError::WrongSymbolAfterBody);
        }

        let body = bytes[body_start..body_end].to_vec();
        validate(command, &headers, &body)?;

        Ok(Self {
            command,
            headers,
            body,
        })
    }

    /// Command on the first line.
    #[must_use]
    pub fn command(&self) -> Command {
        self.command
    }

    /// All headers, first occurrence of each key.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Value of `name`, if the frame carries it.
    #[must_use]
    pub fn header(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(&name).map(String::as_str)
    }

    /// Raw body bytes, without the NUL terminator.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, when it is valid UTF-8.
    #[must_use]
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Wire bytes for this frame. Headers are emitted in key order. A frame
    /// parsed from bytes reproduces them only when its header values were
    /// valid UTF-8.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(self.command, &self.headers, &self.body)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.to_bytes()))
    }
}

/// Render a frame to wire bytes, refusing anything the parser would reject.
///
/// # Errors
///
/// [`StompError::HeaderNoSeparator`] when a header value contains a newline,
/// otherwise the [`StompError`] the parser reports for the rendered bytes.
pub fn serialize(command: Command, headers: &Headers, body: &[u8]) -> Result<Vec<u8>, StompError> {
    let bytes = render(command, headers, body)?;
    Frame::parse(&bytes)?;
    Ok(bytes)
}

/// Encode caller-supplied parts. A newline inside a value would end its
/// header line early and the rest would parse as headers or body the caller
/// never supplied.
fn render(command: Command, headers: &Headers, body: &[u8]) -> Result<Vec<u8>, StompError> {
    if command == Command::Unknown {
        return Err(StompError::CommandInvalid);
    }
    if headers.values().any(|value| value.as_bytes().contains(&NEWLINE)) {
        return Err(StompError::HeaderNoSeparator);
    }
    Ok(encode(command, headers, body))
}

fn encode(command: Command, headers: &Headers, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(64 + body.len());
    out.extend_from_slice(command.as_str().as_bytes());
    out.push(NEWLINE);
    for (name, value) in headers {
        out.extend_from_slice(name.as_str().as_bytes());
        out.push(SEPARATOR);
        out.extend_from_slice(value.as_bytes());
        out.push(NEWLINE);
    }
    out.push(NEWLINE);
    out.extend_from_slice(body);
    out.push(NUL);
    out
}

fn validate(command: Command, headers: &Headers, body: &[u8]) -> Result<(), StompError> {
    let required = command.required_headers().ok_or(StompError::Unknown)?;
    if !required.iter().all(|name| headers.contains_key(name)) {
        return Err(StompError::HeaderMissing);
    }

    if let Some(declared) = headers.get(&HeaderName::ContentLength) {
        if content_length(declared)? != body.len() {
            return Err(StompError::BodyLength);
        }
    }
    Ok(())
}

/// ASCII digits only; a leading sign is rejected.
fn content_length(value: &str) -> Result<usize, StompError> {
    if !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(StompError::HeaderContentLength);
    }
    value
        .parse::<usize>()
        .map_err(|_| StompError::HeaderContentLength)
}

fn find(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..]
        .iter()
        .position(|&byte| byte == needle)
        .map(|offset| from + offset)
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
