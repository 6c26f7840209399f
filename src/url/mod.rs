//! Request-target dissection.
//!
//! [`Url::parse`] annotates a complete URL buffer with `(offset, length)`
//! spans, one per component, without copying or decoding anything:
//!
//! ```not_rust
//!   http://u:p@example.com:8042/over/there?name=ferret#nose
//!   \__/   \_/ \_________/ \__/\_________/ \_________/ \__/
//!  schema   |      host    port    path       query    frag
//!        userinfo
//! ```
//!
//! The same character machine validates request targets on the fly while
//! a request line streams through the message parser.
use crate::matches;
use crate::parser::state::State;
use crate::parser::Mode;

mod host;

#[cfg(test)]
mod test;

/// A possible error value when dissecting a URL.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum UrlError {
    /// Invalid character for the component being scanned.
    Char,
    /// Authority section does not parse as userinfo/host/port.
    Host,
    /// Port value does not fit 16 bits.
    Port,
    /// A CONNECT target must be exactly `host:port`.
    Connect,
    /// Buffer length exceeds the span encoding.
    TooLong,
}

// ===== Error =====

macro_rules! gen_error {
    ($($variant:pat => $msg:literal),* $(,)?) => {
        impl std::fmt::Display for UrlError {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                use UrlError::*;
                match self {
                    $($variant => f.write_str($msg),)*
                }
            }
        }
    };
}

gen_error! {
    Char => "URL contains invalid character",
    Host => "URL authority is invalid",
    Port => "URL port out of range",
    Connect => "CONNECT target must be host:port",
    TooLong => "URL too long",
}

impl std::error::Error for UrlError {}

impl std::fmt::Debug for UrlError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "\"{self}\"")
    }
}

// ===== Fields =====

/// URL component kind, indexing the spans of a [`Url`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Schema = 0,
    Host = 1,
    Port = 2,
    Path = 3,
    Query = 4,
    Fragment = 5,
    Userinfo = 6,
}

impl Field {
    pub(crate) const COUNT: usize = 7;
}

#[inline]
pub(crate) const fn bit(field: Field) -> u8 {
    1 << field as u8
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Span {
    pub(crate) off: u16,
    pub(crate) len: u16,
}

/// Span descriptor of a dissected URL: one `(offset, length)` slot per
/// [`Field`], a present-bitset, and the decoded port.
///
/// Offsets are relative to the buffer given to [`Url::parse`]; the
/// descriptor owns nothing.
#[derive(Debug, Clone)]
pub struct Url {
    fields: [Span; Field::COUNT],
    field_set: u8,
    port: u16,
}

impl Url {
    /// Dissects `buf` as a request target, leniently.
    ///
    /// `is_connect` selects the CONNECT form, which must be exactly
    /// `host:port`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use torii::url::{Field, Url};
    /// let buf = b"http://example.com/users/all";
    /// let url = Url::parse(buf, false).unwrap();
    /// assert_eq!(url.slice(Field::Host, buf), Some(&b"example.com"[..]));
    /// assert_eq!(url.slice(Field::Path, buf), Some(&b"/users/all"[..]));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the input is not a valid request target.
    pub fn parse(buf: &[u8], is_connect: bool) -> Result<Url, UrlError> {
        Self::parse_with(buf, is_connect, Mode::Lenient)
    }

    /// Dissects `buf` under an explicit grammar [`Mode`].
    pub fn parse_with(buf: &[u8], is_connect: bool, mode: Mode) -> Result<Url, UrlError> {
        if buf.len() > u16::MAX as usize {
            return Err(UrlError::TooLong);
        }
        let strict = mode.is_strict();

        let mut url = Url {
            fields: [Span::default(); Field::COUNT],
            field_set: 0,
            port: 0,
        };

        let mut s = if is_connect {
            State::ReqServerStart
        } else {
            State::ReqSpacesBeforeUrl
        };
        let mut old_uf: Option<Field> = None;
        let mut found_at = false;

        for (i, &ch) in buf.iter().enumerate() {
            s = parse_url_char(s, ch, strict);

            // which field is this byte part of?
            let uf = match s {
                State::Dead => return Err(UrlError::Char),

                // delimiters carry no field bytes
                State::ReqSchemaSlash
                | State::ReqSchemaSlashSlash
                | State::ReqServerStart
                | State::ReqQueryStringStart
                | State::ReqFragmentStart => continue,

                State::ReqSchema => Field::Schema,
                State::ReqServerWithAt => {
                    found_at = true;
                    Field::Host
                }
                State::ReqServer => Field::Host,
                State::ReqPath => Field::Path,
                State::ReqQueryString => Field::Query,
                State::ReqFragment => Field::Fragment,

                _ => return Err(UrlError::Char),
            };

            if old_uf == Some(uf) {
                url.fields[uf as usize].len += 1;
                continue;
            }

            url.fields[uf as usize] = Span {
                off: i as u16,
                len: 1,
            };
            url.field_set |= bit(uf);
            old_uf = Some(uf);
        }

        // host must be present when there is a schema: "http:///x" fails
        if url.field_set & (bit(Field::Schema) | bit(Field::Host)) != 0 {
            host::parse_host(buf, &mut url, found_at, strict)?;
        }

        if is_connect && url.field_set != (bit(Field::Host) | bit(Field::Port)) {
            return Err(UrlError::Connect);
        }

        if url.field_set & bit(Field::Port) != 0 {
            // digits were validated by the scan
            let span = url.fields[Field::Port as usize];
            let digits = &buf[span.off as usize..span.off as usize + span.len as usize];
            let mut value: u32 = 0;
            for &d in digits {
                value = value * 10 + u32::from(d - b'0');
                if value > 0xffff {
                    return Err(UrlError::Port);
                }
            }
            url.port = value as u16;
        }

        Ok(url)
    }

    /// Whether `field` was present in the dissected URL.
    #[inline]
    pub fn is_set(&self, field: Field) -> bool {
        self.field_set & bit(field) != 0
    }

    /// `(offset, length)` of `field` relative to the parsed buffer.
    #[inline]
    pub fn span(&self, field: Field) -> Option<(usize, usize)> {
        if self.is_set(field) {
            let span = self.fields[field as usize];
            Some((span.off as usize, span.len as usize))
        } else {
            None
        }
    }

    /// The bytes of `field` within `buf`, which must be the buffer the
    /// URL was parsed from.
    #[inline]
    pub fn slice<'b>(&self, field: Field, buf: &'b [u8]) -> Option<&'b [u8]> {
        let (off, len) = self.span(field)?;
        Some(&buf[off..off + len])
    }

    /// Decoded port number; 0 when the URL carries none.
    #[inline]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

// ===== Character machine =====

/// One step of the URL grammar: the state after `ch`, or [`State::Dead`].
///
/// Only meaningful for non-whitespace input; SP/CR/LF kill the scan, as
/// do HTAB/FF in strict mode. Shared between the standalone dissection
/// above and the request-line validation inside the message parser.
pub(crate) fn parse_url_char(s: State, ch: u8, strict: bool) -> State {
    if ch == b' ' || ch == b'\r' || ch == b'\n' {
        return State::Dead;
    }

    if strict && (ch == b'\t' || ch == 0x0c) {
        return State::Dead;
    }

    match s {
        State::ReqSpacesBeforeUrl => {
            // proxied requests start with the scheme of an absolute URI;
            // every method but CONNECT is followed by '/' or '*'
            if ch == b'/' || ch == b'*' {
                return State::ReqPath;
            }
            if matches::is_alpha(ch) {
                return State::ReqSchema;
            }
        }

        State::ReqSchema => {
            if matches::is_alpha(ch) {
                return s;
            }
            if ch == b':' {
                return State::ReqSchemaSlash;
            }
        }

        State::ReqSchemaSlash => {
            if ch == b'/' {
                return State::ReqSchemaSlashSlash;
            }
        }

        State::ReqSchemaSlashSlash => {
            if ch == b'/' {
                return State::ReqServerStart;
            }
        }

        State::ReqServerWithAt | State::ReqServerStart | State::ReqServer => {
            // a second '@' would make the authority ambiguous
            if s == State::ReqServerWithAt && ch == b'@' {
                return State::Dead;
            }
            if ch == b'/' {
                return State::ReqPath;
            }
            if ch == b'?' {
                return State::ReqQueryStringStart;
            }
            if ch == b'@' {
                return State::ReqServerWithAt;
            }
            if matches::is_userinfo_char(ch) || ch == b'[' || ch == b']' {
                return State::ReqServer;
            }
        }

        State::ReqPath => {
            if matches::is_url_char(ch, strict) {
                return s;
            }
            match ch {
                b'?' => return State::ReqQueryStringStart,
                b'#' => return State::ReqFragmentStart,
                _ => {}
            }
        }

        State::ReqQueryStringStart | State::ReqQueryString => {
            if matches::is_url_char(ch, strict) {
                return State::ReqQueryString;
            }
            match ch {
                // allow extra '?' in query string
                b'?' => return State::ReqQueryString,
                b'#' => return State::ReqFragmentStart,
                _ => {}
            }
        }

        State::ReqFragmentStart => {
            if matches::is_url_char(ch, strict) {
                return State::ReqFragment;
            }
            match ch {
                b'?' => return State::ReqFragment,
                b'#' => return s,
                _ => {}
            }
        }

        State::ReqFragment => {
            if matches::is_url_char(ch, strict) {
                return s;
            }
            if ch == b'?' || ch == b'#' {
                return s;
            }
        }

        _ => {}
    }

    // anything else is an error transition
    State::Dead
}
