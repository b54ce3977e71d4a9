/// Classified failure from [`Frame::parse`](crate::Frame::parse) or
/// [`serialize`](crate::serialize).
///
/// Variants are reported in scan order: the first problem found while
/// walking the frame front to back wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum StompError {
    /// The command line is not one of the STOMP commands.
    #[error("invalid command")]
    CommandInvalid,
    /// No newline at all after the command.
    #[error("frame has no header section")]
    HeaderEmpty,
    /// Input ended in the middle of a header line.
    #[error("header line is missing its newline")]
    HeaderMissingNewLine,
    /// A header line has no `:` between key and value.
    #[error("header line has no key/value separator")]
    HeaderNoSeparator,
    /// A header key outside the supported set.
    #[error("unrecognized header key")]
    HeaderInvalidKey,
    /// A header key with nothing after the separator.
    #[error("header value is empty")]
    HeaderEmptyValue,
    /// The header section never reached its blank line.
    #[error("header section is not terminated by a blank line")]
    BodyNoNewLine,
    /// The body is not followed by a NUL terminator.
    #[error("body is missing its NUL terminator")]
    BodyMissingNull,
    /// The declared `content-length` disagrees with the body.
    #[error("body length does not match content-length")]
    BodyLength,
    /// `content-length` is not a non-negative integer.
    #[error("content-length is not a valid length")]
    HeaderContentLength,
    /// Something other than newlines after the NUL terminator.
    #[error("unexpected byte after frame body")]
    WrongSymbolAfterBody,
    /// A header required by the command is absent.
    #[error("required header is missing")]
    HeaderMissing,
    /// The command has no validation rules.
    #[error("unknown frame error")]
    Unknown,
}
