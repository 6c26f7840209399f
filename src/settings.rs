use crate::Parser;

/// Returned by a callback to stop parsing at the current byte.
///
/// The parser records the matching `CB_*` [`Errno`][crate::Errno] and goes
/// sticky; the `execute` return value is the index of the byte being
/// processed when the callback aborted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Abort;

/// Body directive returned by [`Settings::on_headers_complete`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BodyPolicy {
    /// Frame the body from the message's own headers.
    #[default]
    Read,
    /// This message has no body, whatever its headers say. Needed for the
    /// response to a HEAD request and for completed CONNECT tunnels.
    Skip,
}

/// Event and data notifications surfaced while bytes flow through
/// [`Parser::execute`].
///
/// Every method has a no-op default, so an implementation only overrides
/// what it consumes. Data callbacks borrow slices of the input buffer
/// passed to the current `execute` call; a single logical field (URL,
/// header name, header value, reason phrase, body) may arrive in several
/// slices across successive calls and must be concatenated by the
/// receiver. No callback may retain its slice past the call.
///
/// Callbacks receive the parser behind a shared reference: they can read
/// the observable fields ([`method`][Parser::method],
/// [`http_version`][Parser::http_version],
/// [`status_code`][Parser::status_code], [`is_upgrade`][Parser::is_upgrade],
/// [`errno`][Parser::errno]) and may call [`Parser::pause`], nothing else.
pub trait Settings {
    /// A new message has started.
    fn on_message_begin(&mut self, parser: &Parser) -> Result<(), Abort> {
        let _ = parser;
        Ok(())
    }

    /// Request-target bytes.
    fn on_url(&mut self, parser: &Parser, data: &[u8]) -> Result<(), Abort> {
        let _ = (parser, data);
        Ok(())
    }

    /// Reason-phrase bytes of a status line.
    fn on_status(&mut self, parser: &Parser, data: &[u8]) -> Result<(), Abort> {
        let _ = (parser, data);
        Ok(())
    }

    /// Header-name bytes.
    fn on_header_field(&mut self, parser: &Parser, data: &[u8]) -> Result<(), Abort> {
        let _ = (parser, data);
        Ok(())
    }

    /// Header-value bytes. Obsolete line folding is surfaced as a
    /// synthetic single-space slice between the folded parts.
    fn on_header_value(&mut self, parser: &Parser, data: &[u8]) -> Result<(), Abort> {
        let _ = (parser, data);
        Ok(())
    }

    /// The header section is complete. `header_size` is the number of
    /// bytes consumed for the start line and headers of this message.
    ///
    /// Return [`BodyPolicy::Skip`] to assert that this message carries no
    /// body regardless of its framing headers.
    fn on_headers_complete(
        &mut self,
        parser: &Parser,
        header_size: usize,
    ) -> Result<BodyPolicy, Abort> {
        let _ = (parser, header_size);
        Ok(BodyPolicy::Read)
    }

    /// Body bytes, identity or chunked.
    fn on_body(&mut self, parser: &Parser, data: &[u8]) -> Result<(), Abort> {
        let _ = (parser, data);
        Ok(())
    }

    /// The message is complete.
    fn on_message_complete(&mut self, parser: &Parser) -> Result<(), Abort> {
        let _ = parser;
        Ok(())
    }

    /// A chunk-size line has been read; the chunk length is available as
    /// [`Parser::content_length`]. A length of zero announces the final
    /// chunk and the trailer section.
    fn on_chunk_header(&mut self, parser: &Parser) -> Result<(), Abort> {
        let _ = parser;
        Ok(())
    }

    /// The current chunk, including its trailing CRLF, is complete.
    fn on_chunk_complete(&mut self, parser: &Parser) -> Result<(), Abort> {
        let _ = parser;
        Ok(())
    }
}
