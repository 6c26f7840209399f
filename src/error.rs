/// Parse error kind, stored stickily in the parser.
///
/// `Ok` is the quiescent value; every other variant stops the parser at
/// the offending byte and keeps it stopped. [`Paused`] is the one
/// recoverable variant, cleared by [`Parser::pause`].
///
/// [`Paused`]: Errno::Paused
/// [`Parser::pause`]: crate::Parser::pause
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Errno {
    Ok,
    Paused,

    CbMessageBegin,
    CbUrl,
    CbStatus,
    CbHeaderField,
    CbHeaderValue,
    CbHeadersComplete,
    CbBody,
    CbMessageComplete,
    CbChunkHeader,
    CbChunkComplete,

    InvalidEofState,
    HeaderOverflow,
    ClosedConnection,
    InvalidVersion,
    InvalidStatus,
    InvalidMethod,
    InvalidUrl,
    InvalidHost,
    InvalidPort,
    InvalidPath,
    InvalidQueryString,
    InvalidFragment,
    LfExpected,
    InvalidHeaderToken,
    InvalidContentLength,
    InvalidChunkSize,
    InvalidConstant,
    InvalidInternalState,
    Strict,
    Unknown,
    HugeContentLength,
    HugeChunkSize,
}

// ===== Error =====

macro_rules! gen_errno {
    ($($variant:ident => $name:literal, $msg:literal;)*) => {
        impl Errno {
            /// Stable identifier, e.g. `"INVALID_VERSION"`.
            pub const fn name(&self) -> &'static str {
                use Errno::*;
                match self {
                    $($variant => $name,)*
                }
            }

            /// Human-readable description.
            pub const fn description(&self) -> &'static str {
                use Errno::*;
                match self {
                    $($variant => $msg,)*
                }
            }
        }

        impl std::fmt::Display for Errno {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str(self.description())
            }
        }
    };
}

gen_errno! {
    Ok => "OK", "success";
    Paused => "PAUSED", "parser is paused";

    CbMessageBegin => "CB_MESSAGE_BEGIN", "the on_message_begin callback failed";
    CbUrl => "CB_URL", "the on_url callback failed";
    CbStatus => "CB_STATUS", "the on_status callback failed";
    CbHeaderField => "CB_HEADER_FIELD", "the on_header_field callback failed";
    CbHeaderValue => "CB_HEADER_VALUE", "the on_header_value callback failed";
    CbHeadersComplete => "CB_HEADERS_COMPLETE", "the on_headers_complete callback failed";
    CbBody => "CB_BODY", "the on_body callback failed";
    CbMessageComplete => "CB_MESSAGE_COMPLETE", "the on_message_complete callback failed";
    CbChunkHeader => "CB_CHUNK_HEADER", "the on_chunk_header callback failed";
    CbChunkComplete => "CB_CHUNK_COMPLETE", "the on_chunk_complete callback failed";

    InvalidEofState => "INVALID_EOF_STATE", "stream ended at an unexpected time";
    HeaderOverflow => "HEADER_OVERFLOW", "too many header bytes seen; overflow detected";
    ClosedConnection => "CLOSED_CONNECTION", "data received after completed connection: close message";
    InvalidVersion => "INVALID_VERSION", "invalid HTTP version";
    InvalidStatus => "INVALID_STATUS", "invalid HTTP status code";
    InvalidMethod => "INVALID_METHOD", "invalid HTTP method";
    InvalidUrl => "INVALID_URL", "invalid URL";
    InvalidHost => "INVALID_HOST", "invalid host";
    InvalidPort => "INVALID_PORT", "invalid port";
    InvalidPath => "INVALID_PATH", "invalid path";
    InvalidQueryString => "INVALID_QUERY_STRING", "invalid query string";
    InvalidFragment => "INVALID_FRAGMENT", "invalid fragment";
    LfExpected => "LF_EXPECTED", "LF character expected";
    InvalidHeaderToken => "INVALID_HEADER_TOKEN", "invalid character in header";
    InvalidContentLength => "INVALID_CONTENT_LENGTH", "invalid character in content-length header";
    InvalidChunkSize => "INVALID_CHUNK_SIZE", "invalid character in chunk size header";
    InvalidConstant => "INVALID_CONSTANT", "invalid constant string";
    InvalidInternalState => "INVALID_INTERNAL_STATE", "encountered unexpected internal state";
    Strict => "STRICT", "strict mode assertion failed";
    Unknown => "UNKNOWN", "an unknown error occurred";
    HugeContentLength => "HUGE_CONTENT_LENGTH", "content-length overflow";
    HugeChunkSize => "HUGE_CHUNK_SIZE", "chunk size overflow";
}

impl std::error::Error for Errno {}

impl std::fmt::Debug for Errno {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Errno {
    /// Returns `true` for the quiescent [`Ok`](Errno::Ok) value.
    #[inline]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Errno::Ok)
    }

    /// Returns `true` while the parser is paused.
    #[inline]
    pub const fn is_paused(&self) -> bool {
        matches!(self, Errno::Paused)
    }
}
