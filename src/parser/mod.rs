//! HTTP/1.x message parser.
//!
//! [`Parser::execute`] pushes one buffer of bytes through the machine and
//! surfaces structure via the [`Settings`] callbacks. The parser never
//! copies nor allocates: data callbacks borrow slices of the buffer being
//! executed, and a field interrupted by the end of a buffer is delivered
//! in parts across calls.
use std::cell::Cell;

use crate::error::Errno;
use crate::log::{debug, trace, warning};
use crate::matches;
use crate::method::Method;
use crate::settings::{BodyPolicy, Settings};

pub(crate) mod state;

use state::{HeaderState, State};


/// Default bound on the bytes of one header section (or one chunk frame).
pub const DEFAULT_MAX_HEADER_SIZE: usize = 80 * 1024;

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const QT: u8 = b'"';
const BS: u8 = b'\\';

const CONTENT_LENGTH: &[u8] = b"content-length";
const TRANSFER_ENCODING: &[u8] = b"transfer-encoding";
const UPGRADE: &[u8] = b"upgrade";
const CHUNKED: &[u8] = b"chunked";

/// What the parser is bound to parse, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Kind {
    #[default]
    Request,
    Response,
    /// Auto-detect request vs. response from the first bytes.
    Either,
}

/// Grammar tolerance, fixed at construction.
///
/// Lenient mode accepts bare `LF` line endings, arbitrary bytes at
/// fixed-literal positions (`HTTP/`, the schema slashes, chunk
/// delimiters), high-bit and HTAB/FF bytes in URLs, and `_` in host
/// names. Strict mode turns each of those into [`Errno::Strict`] or the
/// dead URL state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Lenient,
    Strict,
}

impl Mode {
    #[inline]
    pub const fn is_strict(&self) -> bool {
        matches!(self, Mode::Strict)
    }
}

// ===== Flags =====

/// Per-message framing flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Flags(u8);

impl Flags {
    pub(crate) const CHUNKED: u8 = 1 << 0;
    #[allow(dead_code)]
    pub(crate) const CONNECTION_KEEP_ALIVE: u8 = 1 << 1;
    #[allow(dead_code)]
    pub(crate) const CONNECTION_CLOSE: u8 = 1 << 2;
    pub(crate) const TRAILING: u8 = 1 << 3;
    pub(crate) const UPGRADE: u8 = 1 << 4;
    pub(crate) const SKIPBODY: u8 = 1 << 5;

    #[inline]
    fn set(&mut self, bit: u8) {
        self.0 |= bit;
    }

    #[inline]
    fn contains(&self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    #[inline]
    fn reset(&mut self) {
        self.0 = 0;
    }
}

// ===== Parser =====

/// Incremental HTTP/1.x message parser.
///
/// A parser is created once per connection direction and reused across
/// the messages on it; between messages it returns to its per-kind start
/// state by itself. It holds no buffers: `execute` borrows the caller's
/// bytes for the duration of one call only.
#[derive(Debug)]
pub struct Parser {
    kind: Kind,
    mode: Mode,
    state: State,
    header_state: HeaderState,
    flags: Flags,
    /// Shared cursor: method-disambiguation position, then header-name
    /// match position.
    index: usize,
    /// Header-region bytes consumed for the current message or chunk.
    nread: usize,
    max_header_size: usize,
    /// Bytes of body remaining; -1 means "unspecified".
    content_length: i64,
    http_major: u16,
    http_minor: u16,
    status_code: u16,
    method: Method,
    upgrade: bool,
    /// Interiorly mutable so callbacks holding `&Parser` can pause.
    errno: Cell<Errno>,
}

impl Parser {
    /// Creates a lenient parser bound to `kind`.
    pub fn new(kind: Kind) -> Self {
        Self::with_mode(kind, Mode::Lenient)
    }

    /// Creates a parser bound to `kind` with an explicit grammar [`Mode`].
    pub fn with_mode(kind: Kind, mode: Mode) -> Self {
        Parser {
            kind,
            mode,
            state: match kind {
                Kind::Request => State::PreStartReq,
                Kind::Response => State::PreStartRes,
                Kind::Either => State::PreStartReqOrRes,
            },
            header_state: HeaderState::General,
            flags: Flags::default(),
            index: 0,
            nread: 0,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            content_length: -1,
            http_major: 0,
            http_minor: 0,
            status_code: 0,
            method: Method::default(),
            upgrade: false,
            errno: Cell::new(Errno::Ok),
        }
    }

    /// The kind this parser is bound to. For an [`Either`][Kind::Either]
    /// parser this reflects the detected kind once a message has started.
    #[inline]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current error value; [`Errno::Ok`] while parsing normally.
    #[inline]
    pub fn errno(&self) -> Errno {
        self.errno.get()
    }

    /// Request method of the current message.
    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Status code of the current response message.
    #[inline]
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    #[inline]
    pub fn http_major(&self) -> u16 {
        self.http_major
    }

    #[inline]
    pub fn http_minor(&self) -> u16 {
        self.http_minor
    }

    /// `(major, minor)` of the current message.
    #[inline]
    pub fn http_version(&self) -> (u16, u16) {
        (self.http_major, self.http_minor)
    }

    /// `true` once the current message upgrades the connection (an
    /// `Upgrade:` header or a CONNECT request). Readable from
    /// `on_headers_complete` onward.
    #[inline]
    pub fn is_upgrade(&self) -> bool {
        self.upgrade
    }

    /// Remaining body or chunk length; -1 when no framing header
    /// specified one.
    #[inline]
    pub fn content_length(&self) -> i64 {
        self.content_length
    }

    /// Bound on the byte size of a header section (default
    /// [`DEFAULT_MAX_HEADER_SIZE`]). Exceeding it fails the parse with
    /// [`Errno::HeaderOverflow`].
    pub fn set_max_header_size(&mut self, limit: usize) {
        self.max_header_size = limit;
    }

    /// Pauses (`true`) or resumes (`false`) the parser.
    ///
    /// May be called from inside a callback; `execute` then stops at the
    /// current byte and reports the bytes consumed so far. Feeding the
    /// rest of the buffer after resuming continues the message. Legal
    /// only while the parser is not in an error state.
    pub fn pause(&self, paused: bool) {
        match self.errno.get() {
            Errno::Ok | Errno::Paused => {
                self.errno.set(if paused { Errno::Paused } else { Errno::Ok });
            }
            _ => debug_assert!(false, "pausing a parser in an error state"),
        }
    }

    /// Start state for the next message on this connection.
    #[inline]
    fn new_message_state(&self) -> State {
        match self.kind {
            Kind::Request => State::PreStartReq,
            _ => State::PreStartRes,
        }
    }
}

// ===== Callback plumbing =====

macro_rules! fail {
    ($self:ident, $errno:ident, $p:expr) => {{
        debug!("parse error at {}: {}", $p, Errno::$errno.name());
        $self.errno.set(Errno::$errno);
        return $p;
    }};
}

macro_rules! strict_check {
    ($self:ident, $cond:expr, $p:expr) => {
        if $self.mode.is_strict() && $cond {
            fail!($self, Strict, $p);
        }
    };
}

/// Run an event callback; bail out of `execute` with `$ret` on abort or
/// pause.
macro_rules! callback_notify {
    ($self:ident, $settings:ident.$cb:ident, $errno:ident, $ret:expr) => {{
        debug_assert!($self.errno.get().is_ok());
        if $settings.$cb(&*$self).is_err() {
            $self.errno.set(Errno::$errno);
        }
        if !$self.errno.get().is_ok() {
            return $ret;
        }
    }};
}

/// Flush `$mark..$end` of the buffer through a data callback, clearing
/// the mark; bail out of `execute` with `$ret` on abort or pause.
macro_rules! callback_data {
    ($self:ident, $settings:ident.$cb:ident, $errno:ident, $mark:ident, $data:ident, $end:expr, $ret:expr) => {{
        if let Some(mark) = $mark.take() {
            debug_assert!($self.errno.get().is_ok());
            if $settings.$cb(&*$self, &$data[mark..$end]).is_err() {
                $self.errno.set(Errno::$errno);
            }
            if !$self.errno.get().is_ok() {
                return $ret;
            }
        }
    }};
}

/// Deliver the synthetic single space of a folded header value.
macro_rules! callback_space {
    ($self:ident, $settings:ident, $ret:expr) => {{
        if $settings.on_header_value(&*$self, b" ").is_err() {
            $self.errno.set(Errno::CbHeaderValue);
            return $ret;
        }
        if !$self.errno.get().is_ok() {
            return $ret;
        }
    }};
}

/// Set a mark if none is live.
macro_rules! mark {
    ($mark:ident, $p:expr) => {
        if $mark.is_none() {
            $mark = Some($p);
        }
    };
}

impl Parser {
    /// Pushes `data` through the machine, invoking `settings` callbacks
    /// as structure is recognized, and returns the number of bytes
    /// consumed.
    ///
    /// An empty `data` signals end-of-stream: legal before a message has
    /// started (no-op) and while reading a body delimited by connection
    /// close (completes the message); any other state fails with
    /// [`Errno::InvalidEofState`].
    ///
    /// The return value equals `data.len()` on undisturbed success.
    /// Otherwise it is the index of the first unconsumed byte: the byte
    /// that caused the error, the byte the parser paused on, or the byte
    /// after the header terminator of an upgrade message (the remainder
    /// belongs to the next protocol and is never consumed). Errors are
    /// sticky: once `errno` is fatal every further call returns 0.
    pub fn execute<S: Settings>(&mut self, settings: &mut S, data: &[u8]) -> usize {
        let len = data.len();

        if !self.errno.get().is_ok() {
            return 0;
        }

        if len == 0 {
            match self.state {
                State::BodyIdentityEof => {
                    // A consuming callback here would report one byte
                    // read if the callback paused.
                    callback_notify!(self, settings.on_message_complete, CbMessageComplete, 0);
                    return 0;
                }
                State::PreStartReqOrRes | State::PreStartRes | State::PreStartReq => return 0,
                _ => {
                    self.errno.set(Errno::InvalidEofState);
                    return 1;
                }
            }
        }

        // Marks are local to one call: re-armed at the buffer base from
        // the entry state, flushed (at most one) on exit.
        let mut header_field_mark: Option<usize> = None;
        let mut header_value_mark: Option<usize> = None;
        let mut url_mark: Option<usize> = None;
        let mut reason_mark: Option<usize> = None;
        let mut body_mark: Option<usize> = None;

        match self.state {
            State::HeaderField => header_field_mark = Some(0),
            State::HeaderValue => header_value_mark = Some(0),
            State::ResStatus => reason_mark = Some(0),
            s if s.is_url_data() => url_mark = Some(0),
            _ => {}
        }

        // Base of the overflow-accounting window: the later of the buffer
        // start and the start of the current message or chunk.
        let mut header_start = 0usize;
        let strict = self.mode.is_strict();

        let mut p = 0usize;
        while p < len {
            let ch = data[p];

            'reexecute: loop {
                match self.state {
                    State::PreStartReqOrRes => {
                        if ch != CR && ch != LF {
                            self.state = State::StartReqOrRes;
                            trace!("message begin");
                            callback_notify!(self, settings.on_message_begin, CbMessageBegin, p);
                            continue 'reexecute;
                        }
                    }

                    State::StartReqOrRes => {
                        self.flags.reset();
                        self.content_length = -1;

                        if ch == b'H' {
                            self.state = State::ResOrRespH;
                        } else {
                            self.kind = Kind::Request;
                            self.state = State::StartReq;
                            continue 'reexecute;
                        }
                    }

                    State::ResOrRespH => {
                        if ch == b'T' {
                            self.kind = Kind::Response;
                            self.state = State::ResHt;
                        } else {
                            if ch != b'E' {
                                fail!(self, InvalidConstant, p);
                            }
                            self.kind = Kind::Request;
                            self.method = Method::HEAD;
                            self.index = 2;
                            self.state = State::ReqMethod;
                        }
                    }

                    State::PreStartRes => {
                        if ch != CR && ch != LF {
                            self.state = State::StartRes;
                            trace!("message begin");
                            callback_notify!(self, settings.on_message_begin, CbMessageBegin, p);
                            continue 'reexecute;
                        }
                    }

                    State::StartRes => {
                        self.flags.reset();
                        self.content_length = -1;

                        if ch == b'H' {
                            self.state = State::ResH;
                        } else {
                            fail!(self, InvalidConstant, p);
                        }
                    }

                    State::ResH => {
                        strict_check!(self, ch != b'T', p);
                        self.state = State::ResHt;
                    }

                    State::ResHt => {
                        strict_check!(self, ch != b'T', p);
                        self.state = State::ResHtt;
                    }

                    State::ResHtt => {
                        strict_check!(self, ch != b'P', p);
                        self.state = State::ResHttp;
                    }

                    State::ResHttp => {
                        strict_check!(self, ch != b'/', p);
                        self.state = State::ResFirstHttpMajor;
                    }

                    State::ResFirstHttpMajor => {
                        if !matches::is_num(ch) {
                            fail!(self, InvalidVersion, p);
                        }
                        self.http_major = (ch - b'0') as u16;
                        self.state = State::ResHttpMajor;
                    }

                    State::ResHttpMajor => {
                        if ch == b'.' {
                            self.state = State::ResFirstHttpMinor;
                        } else {
                            if !matches::is_num(ch) {
                                fail!(self, InvalidVersion, p);
                            }
                            self.http_major = self.http_major * 10 + (ch - b'0') as u16;
                            if self.http_major > 999 {
                                fail!(self, InvalidVersion, p);
                            }
                        }
                    }

                    State::ResFirstHttpMinor => {
                        if !matches::is_num(ch) {
                            fail!(self, InvalidVersion, p);
                        }
                        self.http_minor = (ch - b'0') as u16;
                        self.state = State::ResHttpMinor;
                    }

                    State::ResHttpMinor => {
                        if ch == b' ' {
                            self.state = State::ResFirstStatusCode;
                        } else {
                            if !matches::is_num(ch) {
                                fail!(self, InvalidVersion, p);
                            }
                            self.http_minor = self.http_minor * 10 + (ch - b'0') as u16;
                            if self.http_minor > 999 {
                                fail!(self, InvalidVersion, p);
                            }
                        }
                    }

                    State::ResFirstStatusCode => {
                        if !matches::is_num(ch) {
                            if ch != b' ' {
                                fail!(self, InvalidStatus, p);
                            }
                        } else {
                            self.status_code = (ch - b'0') as u16;
                            self.state = State::ResStatusCode;
                        }
                    }

                    State::ResStatusCode => {
                        if !matches::is_num(ch) {
                            match ch {
                                b' ' => self.state = State::ResStatus,
                                CR => self.state = State::ResLineAlmostDone,
                                LF => self.state = State::HeaderFieldStart,
                                _ => fail!(self, InvalidStatus, p),
                            }
                        } else {
                            self.status_code = self.status_code * 10 + (ch - b'0') as u16;
                            if self.status_code > 999 {
                                fail!(self, InvalidStatus, p);
                            }
                        }
                    }

                    State::ResStatus => {
                        // the human-readable reason, e.g. "Not Found"
                        mark!(reason_mark, p);
                        if ch == CR {
                            self.state = State::ResLineAlmostDone;
                            callback_data!(
                                self, settings.on_status, CbStatus, reason_mark, data, p, p + 1
                            );
                        } else if ch == LF {
                            self.state = State::HeaderFieldStart;
                            callback_data!(
                                self, settings.on_status, CbStatus, reason_mark, data, p, p + 1
                            );
                        }
                    }

                    State::ResLineAlmostDone => {
                        strict_check!(self, ch != LF, p);
                        self.state = State::HeaderFieldStart;
                    }

                    State::PreStartReq => {
                        if ch != CR && ch != LF {
                            self.state = State::StartReq;
                            trace!("message begin");
                            callback_notify!(self, settings.on_message_begin, CbMessageBegin, p);
                            continue 'reexecute;
                        }
                    }

                    State::StartReq => {
                        self.flags.reset();
                        self.content_length = -1;

                        if !matches::is_alpha(ch) {
                            fail!(self, InvalidMethod, p);
                        }

                        self.index = 1;
                        self.method = match ch {
                            b'C' => Method::CONNECT, // or COPY, CHECKOUT
                            b'D' => Method::DELETE,
                            b'G' => Method::GET,
                            b'H' => Method::HEAD,
                            b'L' => Method::LOCK,
                            b'M' => Method::MKCOL, // or MOVE, MKACTIVITY, MERGE, M-SEARCH
                            b'N' => Method::NOTIFY,
                            b'O' => Method::OPTIONS,
                            b'P' => Method::POST, // or PROPFIND, PROPPATCH, PUT, PATCH
                            b'R' => Method::REPORT,
                            b'S' => Method::SUBSCRIBE,
                            b'T' => Method::TRACE,
                            b'U' => Method::UNLOCK, // or UNSUBSCRIBE
                            _ => fail!(self, InvalidMethod, p),
                        };
                        self.state = State::ReqMethod;
                    }

                    State::ReqMethod => {
                        if ch == 0 {
                            fail!(self, InvalidMethod, p);
                        }

                        let matcher = self.method.as_str().as_bytes();
                        if ch == b' ' && self.index == matcher.len() {
                            self.state = State::ReqSpacesBeforeUrl;
                        } else if self.index < matcher.len() && ch == matcher[self.index] {
                            // nada
                        } else if self.method == Method::CONNECT {
                            if self.index == 1 && ch == b'H' {
                                self.method = Method::CHECKOUT;
                            } else if self.index == 2 && ch == b'P' {
                                self.method = Method::COPY;
                            } else {
                                fail!(self, Unknown, p);
                            }
                        } else if self.method == Method::MKCOL {
                            if self.index == 1 && ch == b'O' {
                                self.method = Method::MOVE;
                            } else if self.index == 1 && ch == b'E' {
                                self.method = Method::MERGE;
                            } else if self.index == 1 && ch == b'-' {
                                self.method = Method::MSEARCH;
                            } else if self.index == 2 && ch == b'A' {
                                self.method = Method::MKACTIVITY;
                            } else {
                                fail!(self, Unknown, p);
                            }
                        } else if self.index == 1 && self.method == Method::POST {
                            if ch == b'R' {
                                self.method = Method::PROPFIND; // or PROPPATCH
                            } else if ch == b'U' {
                                self.method = Method::PUT;
                            } else if ch == b'A' {
                                self.method = Method::PATCH;
                            } else {
                                fail!(self, Unknown, p);
                            }
                        } else if self.index == 2 && self.method == Method::UNLOCK && ch == b'S' {
                            self.method = Method::UNSUBSCRIBE;
                        } else if self.index == 4 && self.method == Method::PROPFIND && ch == b'P' {
                            self.method = Method::PROPPATCH;
                        } else {
                            fail!(self, InvalidMethod, p);
                        }

                        self.index += 1;
                    }

                    State::ReqSpacesBeforeUrl => {
                        if ch == b' ' {
                        } else if self.method == Method::CONNECT {
                            // CONNECT is followed by host:port, nothing else
                            mark!(url_mark, p);
                            self.state = State::ReqHostStart;
                            continue 'reexecute;
                        } else if ch == b'/' || ch == b'*' {
                            mark!(url_mark, p);
                            self.state = State::ReqPath;
                        } else if matches::is_alpha(ch) {
                            // proxied requests start with the scheme of an
                            // absolute URI
                            mark!(url_mark, p);
                            self.state = State::ReqSchema;
                        } else {
                            fail!(self, InvalidUrl, p);
                        }
                    }

                    State::ReqSchema => {
                        if matches::is_alpha(ch) {
                        } else if ch == b':' {
                            self.state = State::ReqSchemaSlash;
                        } else {
                            fail!(self, InvalidUrl, p);
                        }
                    }

                    State::ReqSchemaSlash => {
                        strict_check!(self, ch != b'/', p);
                        self.state = State::ReqSchemaSlashSlash;
                    }

                    State::ReqSchemaSlashSlash => {
                        strict_check!(self, ch != b'/', p);
                        self.state = State::ReqHostStart;
                    }

                    State::ReqHostStart => {
                        if ch == b'[' {
                            self.state = State::ReqHostIpv6;
                        } else if matches::is_alphanum(ch) {
                            self.state = State::ReqHost;
                        } else {
                            fail!(self, InvalidHost, p);
                        }
                    }

                    State::ReqHost => {
                        if !matches::is_host_char(ch, strict) {
                            self.state = State::ReqHostDone;
                            continue 'reexecute;
                        }
                    }

                    State::ReqHostIpv6 => {
                        if matches::is_hex(ch) || ch == b':' {
                        } else if ch == b']' {
                            self.state = State::ReqHostDone;
                        } else {
                            fail!(self, InvalidHost, p);
                        }
                    }

                    State::ReqHostDone => match ch {
                        b':' => self.state = State::ReqPort,
                        b'/' => self.state = State::ReqPath,
                        b' ' => {
                            // "GET http://foo.bar.com HTTP/1.1" has no path
                            self.state = State::ReqHttpStart;
                            callback_data!(self, settings.on_url, CbUrl, url_mark, data, p, p + 1);
                        }
                        b'?' => self.state = State::ReqQueryStringStart,
                        _ => fail!(self, InvalidHost, p),
                    },

                    State::ReqPort => {
                        if !matches::is_num(ch) {
                            match ch {
                                b'/' => self.state = State::ReqPath,
                                b' ' => {
                                    self.state = State::ReqHttpStart;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                b'?' => self.state = State::ReqQueryStringStart,
                                _ => fail!(self, InvalidPort, p),
                            }
                        }
                    }

                    State::ReqPath => {
                        if !matches::is_url_char(ch, strict) {
                            match ch {
                                b' ' => {
                                    self.state = State::ReqHttpStart;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                CR => {
                                    self.http_major = 0;
                                    self.http_minor = 9;
                                    self.state = State::ReqLineAlmostDone;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                LF => {
                                    self.http_major = 0;
                                    self.http_minor = 9;
                                    self.state = State::HeaderFieldStart;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                b'?' => self.state = State::ReqQueryStringStart,
                                b'#' => self.state = State::ReqFragmentStart,
                                _ => fail!(self, InvalidPath, p),
                            }
                        }
                    }

                    State::ReqQueryStringStart => {
                        if matches::is_url_char(ch, strict) {
                            self.state = State::ReqQueryString;
                        } else {
                            match ch {
                                b'?' => {} // ignore extra '?'
                                b' ' => {
                                    self.state = State::ReqHttpStart;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                CR => {
                                    self.http_major = 0;
                                    self.http_minor = 9;
                                    self.state = State::ReqLineAlmostDone;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                LF => {
                                    self.http_major = 0;
                                    self.http_minor = 9;
                                    self.state = State::HeaderFieldStart;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                b'#' => self.state = State::ReqFragmentStart,
                                _ => fail!(self, InvalidQueryString, p),
                            }
                        }
                    }

                    State::ReqQueryString => {
                        if !matches::is_url_char(ch, strict) {
                            match ch {
                                b'?' => {} // extra '?' stays in the query
                                b' ' => {
                                    self.state = State::ReqHttpStart;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                CR => {
                                    self.http_major = 0;
                                    self.http_minor = 9;
                                    self.state = State::ReqLineAlmostDone;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                LF => {
                                    self.http_major = 0;
                                    self.http_minor = 9;
                                    self.state = State::HeaderFieldStart;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                b'#' => self.state = State::ReqFragmentStart,
                                _ => fail!(self, InvalidQueryString, p),
                            }
                        }
                    }

                    State::ReqFragmentStart => {
                        if matches::is_url_char(ch, strict) {
                            self.state = State::ReqFragment;
                        } else {
                            match ch {
                                b' ' => {
                                    self.state = State::ReqHttpStart;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                CR => {
                                    self.http_major = 0;
                                    self.http_minor = 9;
                                    self.state = State::ReqLineAlmostDone;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                LF => {
                                    self.http_major = 0;
                                    self.http_minor = 9;
                                    self.state = State::HeaderFieldStart;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                b'?' => self.state = State::ReqFragment,
                                b'#' => {}
                                _ => fail!(self, InvalidFragment, p),
                            }
                        }
                    }

                    State::ReqFragment => {
                        if !matches::is_url_char(ch, strict) {
                            match ch {
                                b' ' => {
                                    self.state = State::ReqHttpStart;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                CR => {
                                    self.http_major = 0;
                                    self.http_minor = 9;
                                    self.state = State::ReqLineAlmostDone;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                LF => {
                                    self.http_major = 0;
                                    self.http_minor = 9;
                                    self.state = State::HeaderFieldStart;
                                    callback_data!(
                                        self, settings.on_url, CbUrl, url_mark, data, p, p + 1
                                    );
                                }
                                b'?' | b'#' => {}
                                _ => fail!(self, InvalidFragment, p),
                            }
                        }
                    }

                    State::ReqHttpStart => match ch {
                        b'H' => self.state = State::ReqHttpH,
                        b' ' => {}
                        _ => fail!(self, InvalidConstant, p),
                    },

                    State::ReqHttpH => {
                        strict_check!(self, ch != b'T', p);
                        self.state = State::ReqHttpHt;
                    }

                    State::ReqHttpHt => {
                        strict_check!(self, ch != b'T', p);
                        self.state = State::ReqHttpHtt;
                    }

                    State::ReqHttpHtt => {
                        strict_check!(self, ch != b'P', p);
                        self.state = State::ReqHttpHttp;
                    }

                    State::ReqHttpHttp => {
                        strict_check!(self, ch != b'/', p);
                        self.state = State::ReqFirstHttpMajor;
                    }

                    State::ReqFirstHttpMajor => {
                        if !matches::is_num(ch) {
                            fail!(self, InvalidVersion, p);
                        }
                        self.http_major = (ch - b'0') as u16;
                        self.state = State::ReqHttpMajor;
                    }

                    State::ReqHttpMajor => {
                        if ch == b'.' {
                            self.state = State::ReqFirstHttpMinor;
                        } else {
                            if !matches::is_num(ch) {
                                fail!(self, InvalidVersion, p);
                            }
                            self.http_major = self.http_major * 10 + (ch - b'0') as u16;
                            if self.http_major > 999 {
                                fail!(self, InvalidVersion, p);
                            }
                        }
                    }

                    State::ReqFirstHttpMinor => {
                        if !matches::is_num(ch) {
                            fail!(self, InvalidVersion, p);
                        }
                        self.http_minor = (ch - b'0') as u16;
                        self.state = State::ReqHttpMinor;
                    }

                    State::ReqHttpMinor => {
                        if ch == CR {
                            self.state = State::ReqLineAlmostDone;
                        } else if ch == LF {
                            self.state = State::HeaderFieldStart;
                        } else if !matches::is_num(ch) {
                            fail!(self, InvalidVersion, p);
                        } else {
                            self.http_minor = self.http_minor * 10 + (ch - b'0') as u16;
                            if self.http_minor > 999 {
                                fail!(self, InvalidVersion, p);
                            }
                        }
                    }

                    State::ReqLineAlmostDone => {
                        if ch != LF {
                            fail!(self, LfExpected, p);
                        }
                        self.state = State::HeaderFieldStart;
                    }

                    State::HeaderFieldStart => {
                        if ch == CR {
                            self.state = State::HeadersAlmostDone;
                        } else if ch == LF {
                            // bare `\n` as the second newline ending the
                            // header section
                            self.state = State::HeadersAlmostDone;
                            continue 'reexecute;
                        } else {
                            let c = matches::token(ch);
                            if c == 0 {
                                fail!(self, InvalidHeaderToken, p);
                            }

                            mark!(header_field_mark, p);
                            self.index = 0;
                            self.state = State::HeaderField;

                            self.header_state = match c {
                                b'c' => HeaderState::MatchingContentLength,
                                b't' => HeaderState::MatchingTransferEncoding,
                                b'u' => HeaderState::MatchingUpgrade,
                                _ => HeaderState::General,
                            };
                        }
                    }

                    State::HeaderField => {
                        let c = matches::token(ch);

                        if c != 0 {
                            match self.header_state {
                                HeaderState::General => {
                                    // consume the whole token run at once;
                                    // the terminator is re-dispatched here
                                    while p + 1 < len && matches::token(data[p + 1]) != 0 {
                                        p += 1;
                                    }
                                }

                                HeaderState::MatchingContentLength => {
                                    self.index += 1;
                                    if self.index >= CONTENT_LENGTH.len()
                                        || c != CONTENT_LENGTH[self.index]
                                    {
                                        self.header_state = HeaderState::General;
                                    } else if self.index == CONTENT_LENGTH.len() - 1 {
                                        self.header_state = HeaderState::ContentLength;
                                    }
                                }

                                HeaderState::MatchingTransferEncoding => {
                                    self.index += 1;
                                    if self.index >= TRANSFER_ENCODING.len()
                                        || c != TRANSFER_ENCODING[self.index]
                                    {
                                        self.header_state = HeaderState::General;
                                    } else if self.index == TRANSFER_ENCODING.len() - 1 {
                                        self.header_state = HeaderState::TransferEncoding;
                                    }
                                }

                                HeaderState::MatchingUpgrade => {
                                    self.index += 1;
                                    if self.index >= UPGRADE.len() || c != UPGRADE[self.index] {
                                        self.header_state = HeaderState::General;
                                    } else if self.index == UPGRADE.len() - 1 {
                                        self.header_state = HeaderState::Upgrade;
                                    }
                                }

                                HeaderState::ContentLength
                                | HeaderState::TransferEncoding
                                | HeaderState::Upgrade => {
                                    if ch != b' ' {
                                        self.header_state = HeaderState::General;
                                    }
                                }

                                _ => {
                                    debug_assert!(false, "unknown header_state");
                                    self.header_state = HeaderState::General;
                                }
                            }
                        } else if ch == b':' {
                            self.state = State::HeaderValueStart;
                            callback_data!(
                                self,
                                settings.on_header_field,
                                CbHeaderField,
                                header_field_mark,
                                data,
                                p,
                                p + 1
                            );
                        } else {
                            fail!(self, InvalidHeaderToken, p);
                        }
                    }

                    State::HeaderValueStart => {
                        if ch == b' ' || ch == b'\t' {
                        } else {
                            mark!(header_value_mark, p);

                            self.state = State::HeaderValue;
                            self.index = 0;

                            if ch == CR {
                                self.header_state = HeaderState::General;
                                self.state = State::HeaderAlmostDone;
                                callback_data!(
                                    self,
                                    settings.on_header_value,
                                    CbHeaderValue,
                                    header_value_mark,
                                    data,
                                    p,
                                    p + 1
                                );
                            } else if ch == LF {
                                self.state = State::HeaderFieldStart;
                                callback_data!(
                                    self,
                                    settings.on_header_value,
                                    CbHeaderValue,
                                    header_value_mark,
                                    data,
                                    p,
                                    p + 1
                                );
                            } else {
                                match self.header_state {
                                    HeaderState::Upgrade => {
                                        self.flags.set(Flags::UPGRADE);
                                        self.header_state = HeaderState::General;
                                    }

                                    HeaderState::TransferEncoding => {
                                        // looking for 'Transfer-Encoding: chunked'
                                        self.header_state = if ch.to_ascii_lowercase() == b'c' {
                                            HeaderState::MatchingTransferEncodingChunked
                                        } else {
                                            HeaderState::General
                                        };
                                    }

                                    HeaderState::ContentLength => {
                                        if !matches::is_num(ch) {
                                            fail!(self, InvalidContentLength, p);
                                        }
                                        self.content_length = (ch - b'0') as i64;
                                    }

                                    _ => {
                                        self.header_state = if ch == QT {
                                            HeaderState::GeneralAndQuote
                                        } else {
                                            HeaderState::General
                                        };
                                    }
                                }
                            }
                        }
                    }

                    State::HeaderValue => {
                        if ch == CR && self.header_state != HeaderState::GeneralAndQuoteAndEscape {
                            self.state = State::HeaderAlmostDone;
                            callback_data!(
                                self,
                                settings.on_header_value,
                                CbHeaderValue,
                                header_value_mark,
                                data,
                                p,
                                p + 1
                            );
                        } else if ch == LF
                            && self.header_state != HeaderState::GeneralAndQuoteAndEscape
                        {
                            self.state = State::HeaderAlmostDone;
                            callback_data!(
                                self,
                                settings.on_header_value,
                                CbHeaderValue,
                                header_value_mark,
                                data,
                                p,
                                p
                            );
                            continue 'reexecute;
                        } else {
                            match self.header_state {
                                HeaderState::General => {
                                    if ch == QT {
                                        self.header_state = HeaderState::GeneralAndQuote;
                                    }
                                    // consume the run up to the next CR,
                                    // LF or quote at once
                                    while p + 1 < len && !matches!(data[p + 1], CR | LF | QT) {
                                        p += 1;
                                    }
                                }

                                HeaderState::GeneralAndQuote => {
                                    if ch == QT {
                                        self.header_state = HeaderState::General;
                                    } else if ch == BS {
                                        self.header_state = HeaderState::GeneralAndQuoteAndEscape;
                                    }
                                }

                                HeaderState::GeneralAndQuoteAndEscape => {
                                    self.header_state = HeaderState::GeneralAndQuote;
                                }

                                HeaderState::TransferEncoding => {
                                    fail!(self, InvalidHeaderToken, p);
                                }

                                HeaderState::ContentLength => {
                                    if ch != b' ' {
                                        if !matches::is_num(ch) {
                                            fail!(self, InvalidContentLength, p);
                                        }
                                        if self.content_length > (i64::MAX - 10) / 10 {
                                            fail!(self, HugeContentLength, p);
                                        }
                                        self.content_length =
                                            self.content_length * 10 + (ch - b'0') as i64;
                                    }
                                }

                                HeaderState::MatchingTransferEncodingChunked => {
                                    self.index += 1;
                                    if self.index >= CHUNKED.len()
                                        || ch.to_ascii_lowercase() != CHUNKED[self.index]
                                    {
                                        self.header_state = HeaderState::General;
                                    } else if self.index == CHUNKED.len() - 1 {
                                        self.header_state = HeaderState::TransferEncodingChunked;
                                    }
                                }

                                HeaderState::TransferEncodingChunked => {
                                    if ch != b' ' {
                                        self.header_state = HeaderState::General;
                                    }
                                }

                                _ => {
                                    self.state = State::HeaderValue;
                                    self.header_state = HeaderState::General;
                                }
                            }
                        }
                    }

                    State::HeaderAlmostDone => {
                        self.state = if ch == LF {
                            State::HeaderValueLws
                        } else {
                            State::HeaderValue
                        };

                        if self.header_state == HeaderState::TransferEncodingChunked {
                            self.flags.set(Flags::CHUNKED);
                        }

                        if ch != LF {
                            // CR not followed by LF continues the value
                            // with a synthetic space
                            callback_space!(self, settings, p);
                        }
                    }

                    State::HeaderValueLws => {
                        if ch == b' ' || ch == b'\t' {
                            // obs-fold: the value continues on this line
                            self.state = State::HeaderValueStart;
                            callback_space!(self, settings, p);
                        } else {
                            self.state = State::HeaderFieldStart;
                            continue 'reexecute;
                        }
                    }

                    State::HeadersAlmostDone => {
                        strict_check!(self, ch != LF, p);

                        if self.flags.contains(Flags::TRAILING) {
                            // end of a chunked message
                            self.state = State::MessageDone;
                            callback_notify!(self, settings.on_chunk_complete, CbChunkComplete, p);
                            continue 'reexecute;
                        }

                        self.state = State::HeadersDone;

                        // set here so on_headers_complete can observe it
                        self.upgrade =
                            self.flags.contains(Flags::UPGRADE) || self.method == Method::CONNECT;

                        trace!(
                            "headers complete: content_length={} chunked={} upgrade={}",
                            self.content_length,
                            self.flags.contains(Flags::CHUNKED),
                            self.upgrade,
                        );

                        // Three-valued: the callback may assert that this
                        // message has no body, needed for the response to
                        // a HEAD request.
                        debug_assert!(self.errno.get().is_ok());
                        match settings.on_headers_complete(&*self, p + 1) {
                            Ok(BodyPolicy::Read) => {}
                            Ok(BodyPolicy::Skip) => self.flags.set(Flags::SKIPBODY),
                            Err(_) => {
                                self.errno.set(Errno::CbHeadersComplete);
                                return p;
                            }
                        }
                        if !self.errno.get().is_ok() {
                            return p;
                        }
                        continue 'reexecute;
                    }

                    State::HeadersDone => {
                        strict_check!(self, ch != LF, p);

                        // done with the header region, reset the overflow
                        // window
                        self.nread = 0;
                        header_start = p;

                        let has_body =
                            self.flags.contains(Flags::CHUNKED) || self.content_length > 0;

                        if self.upgrade
                            && (self.method == Method::CONNECT
                                || self.flags.contains(Flags::SKIPBODY)
                                || !has_body)
                        {
                            // the rest of the stream is another protocol
                            self.state = self.new_message_state();
                            callback_notify!(
                                self,
                                settings.on_message_complete,
                                CbMessageComplete,
                                p + 1
                            );
                            return p + 1;
                        }

                        if self.flags.contains(Flags::SKIPBODY) {
                            self.state = self.new_message_state();
                            callback_notify!(
                                self,
                                settings.on_message_complete,
                                CbMessageComplete,
                                p + 1
                            );
                        } else if self.flags.contains(Flags::CHUNKED) {
                            // chunked framing wins over Content-Length
                            self.state = State::ChunkSizeStart;
                        } else if self.content_length == 0 {
                            // explicit Content-Length: 0
                            self.state = self.new_message_state();
                            callback_notify!(
                                self,
                                settings.on_message_complete,
                                CbMessageComplete,
                                p + 1
                            );
                        } else if self.content_length > 0 {
                            self.state = State::BodyIdentity;
                        } else {
                            let sc = self.status_code;
                            if self.kind == Kind::Request
                                || (100..=199).contains(&sc)
                                || sc == 204
                                || sc == 304
                            {
                                // no framing headers and no body allowed
                                self.state = self.new_message_state();
                                callback_notify!(
                                    self,
                                    settings.on_message_complete,
                                    CbMessageComplete,
                                    p + 1
                                );
                            } else {
                                // body runs until the transport closes
                                self.state = State::BodyIdentityEof;
                            }
                        }
                    }

                    State::BodyIdentity => {
                        debug_assert!(self.content_length > 0);
                        let to_read = (self.content_length as u64).min((len - p) as u64) as usize;

                        // content_length is advanced here while p advances
                        // one short, so the loop increment lands past the
                        // consumed block and completion sees its last byte.
                        mark!(body_mark, p);
                        self.content_length -= to_read as i64;
                        p += to_read - 1;

                        if self.content_length == 0 {
                            self.state = State::MessageDone;
                            // deliver through the current byte so that
                            // completion-by-length is observable in this
                            // very call
                            callback_data!(
                                self, settings.on_body, CbBody, body_mark, data, p + 1, p
                            );
                            continue 'reexecute;
                        }
                    }

                    State::BodyIdentityEof => {
                        mark!(body_mark, p);
                        p = len - 1;
                    }

                    State::MessageDone => {
                        self.state = self.new_message_state();
                        self.nread = 0;
                        header_start = p;
                        trace!("message complete");
                        callback_notify!(
                            self,
                            settings.on_message_complete,
                            CbMessageComplete,
                            p + 1
                        );
                        if self.upgrade {
                            // the rest of the stream is another protocol
                            return p + 1;
                        }
                    }

                    State::ChunkSizeStart => {
                        debug_assert!(self.flags.contains(Flags::CHUNKED));

                        let unhex_val = matches::unhex(ch);
                        if unhex_val == -1 {
                            fail!(self, InvalidChunkSize, p);
                        }
                        self.content_length = unhex_val as i64;
                        self.state = State::ChunkSize;
                    }

                    State::ChunkSize => {
                        debug_assert!(self.flags.contains(Flags::CHUNKED));

                        if ch == CR {
                            self.state = State::ChunkSizeAlmostDone;
                        } else {
                            let unhex_val = matches::unhex(ch);
                            if unhex_val == -1 {
                                if ch == b';' || ch == b' ' {
                                    self.state = State::ChunkParameters;
                                } else {
                                    fail!(self, InvalidChunkSize, p);
                                }
                            } else {
                                if self.content_length > (i64::MAX - unhex_val as i64) >> 4 {
                                    fail!(self, HugeChunkSize, p);
                                }
                                self.content_length =
                                    self.content_length * 16 + unhex_val as i64;
                            }
                        }
                    }

                    State::ChunkParameters => {
                        debug_assert!(self.flags.contains(Flags::CHUNKED));
                        // chunk extensions are tolerated and dropped
                        if ch == CR {
                            self.state = State::ChunkSizeAlmostDone;
                        }
                    }

                    State::ChunkSizeAlmostDone => {
                        debug_assert!(self.flags.contains(Flags::CHUNKED));
                        strict_check!(self, ch != LF, p);

                        if self.content_length == 0 {
                            self.flags.set(Flags::TRAILING);
                            self.state = State::HeaderFieldStart;
                        } else {
                            self.state = State::ChunkData;
                        }
                        callback_notify!(self, settings.on_chunk_header, CbChunkHeader, p + 1);
                    }

                    State::ChunkData => {
                        debug_assert!(self.flags.contains(Flags::CHUNKED));
                        debug_assert!(self.content_length > 0);
                        let to_read = (self.content_length as u64).min((len - p) as u64) as usize;

                        // managed as in the identity body above
                        mark!(body_mark, p);
                        self.content_length -= to_read as i64;
                        p += to_read - 1;

                        if self.content_length == 0 {
                            self.state = State::ChunkDataAlmostDone;
                        }
                    }

                    State::ChunkDataAlmostDone => {
                        debug_assert!(self.flags.contains(Flags::CHUNKED));
                        debug_assert!(self.content_length == 0);
                        strict_check!(self, ch != CR, p);
                        self.state = State::ChunkDataDone;
                        callback_data!(self, settings.on_body, CbBody, body_mark, data, p, p + 1);
                    }

                    State::ChunkDataDone => {
                        debug_assert!(self.flags.contains(Flags::CHUNKED));
                        strict_check!(self, ch != LF, p);
                        self.state = State::ChunkSizeStart;
                        self.nread = 0;
                        header_start = p;
                        callback_notify!(self, settings.on_chunk_complete, CbChunkComplete, p + 1);
                    }

                    // the server states belong to the standalone URL
                    // dissector; the inline machine never enters them
                    State::Dead
                    | State::ReqServerStart
                    | State::ReqServer
                    | State::ReqServerWithAt => {
                        fail!(self, InvalidInternalState, p);
                    }
                }

                break 'reexecute;
            }

            p += 1;
        }

        if self.state.is_parsing_header() {
            self.nread += p - header_start;
            if self.nread > self.max_header_size {
                warning!("header region exceeded {} bytes", self.max_header_size);
                self.errno.set(Errno::HeaderOverflow);
                return p;
            }
        }

        // Ran out of bytes with a field open: flush it as a partial
        // slice, to be continued on the next call. At most one mark can
        // be live here.
        debug_assert!(
            usize::from(header_field_mark.is_some())
                + usize::from(header_value_mark.is_some())
                + usize::from(url_mark.is_some())
                + usize::from(reason_mark.is_some())
                + usize::from(body_mark.is_some())
                <= 1
        );

        callback_data!(
            self, settings.on_header_field, CbHeaderField, header_field_mark, data, p, p
        );
        callback_data!(
            self, settings.on_header_value, CbHeaderValue, header_value_mark, data, p, p
        );
        callback_data!(self, settings.on_url, CbUrl, url_mark, data, p, p);
        callback_data!(self, settings.on_status, CbStatus, reason_mark, data, p, p);
        callback_data!(self, settings.on_body, CbBody, body_mark, data, p, p);

        len
    }
}
