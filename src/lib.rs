//! Incremental, zero-copy HTTP/1.x push parser.
//!
//! Feed arbitrary byte chunks to a [`Parser`] and receive the structure
//! of each message — request or status line, headers, body bytes, chunk
//! framing, completion — through the [`Settings`] callbacks. The parser
//! allocates nothing and performs no I/O: data callbacks borrow slices of
//! the caller's buffer, valid for the duration of one
//! [`execute`][Parser::execute] call.
//!
//! ```
//! use torii::{Kind, Parser, Settings};
//!
//! #[derive(Default)]
//! struct Collect {
//!     url: Vec<u8>,
//!     complete: bool,
//! }
//!
//! impl Settings for Collect {
//!     fn on_url(&mut self, _: &Parser, data: &[u8]) -> Result<(), torii::Abort> {
//!         self.url.extend_from_slice(data);
//!         Ok(())
//!     }
//!     fn on_message_complete(&mut self, _: &Parser) -> Result<(), torii::Abort> {
//!         self.complete = true;
//!         Ok(())
//!     }
//! }
//!
//! let mut parser = Parser::new(Kind::Request);
//! let mut collect = Collect::default();
//!
//! // chunk boundaries may fall anywhere
//! parser.execute(&mut collect, b"GET /index.h");
//! parser.execute(&mut collect, b"tml HTTP/1.1\r\n\r\n");
//!
//! assert_eq!(collect.url, b"/index.html");
//! assert!(collect.complete);
//! ```
#![warn(missing_debug_implementations)]

mod error;
mod log;
mod matches;
mod method;
mod parser;
mod settings;

pub mod url;

// ===== Reexports =====

pub use error::Errno;
pub use method::Method;
pub use parser::{Kind, Mode, Parser, DEFAULT_MAX_HEADER_SIZE};
pub use settings::{Abort, BodyPolicy, Settings};
pub use url::{Field, Url, UrlError};
