/// Main machine state. One tag per grammar position; the URL states double
/// as the inline request-target machine and as the standalone dissector's
/// driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    Dead,

    PreStartReqOrRes,
    StartReqOrRes,
    ResOrRespH,

    PreStartRes,
    StartRes,
    ResH,
    ResHt,
    ResHtt,
    ResHttp,
    ResFirstHttpMajor,
    ResHttpMajor,
    ResFirstHttpMinor,
    ResHttpMinor,
    ResFirstStatusCode,
    ResStatusCode,
    ResStatus,
    ResLineAlmostDone,

    PreStartReq,
    StartReq,
    ReqMethod,
    ReqSpacesBeforeUrl,
    ReqSchema,
    ReqSchemaSlash,
    ReqSchemaSlashSlash,
    ReqServerStart,
    ReqServer,
    ReqServerWithAt,
    ReqHostStart,
    ReqHost,
    ReqHostIpv6,
    ReqHostDone,
    ReqPort,
    ReqPath,
    ReqQueryStringStart,
    ReqQueryString,
    ReqFragmentStart,
    ReqFragment,
    ReqHttpStart,
    ReqHttpH,
    ReqHttpHt,
    ReqHttpHtt,
    ReqHttpHttp,
    ReqFirstHttpMajor,
    ReqHttpMajor,
    ReqFirstHttpMinor,
    ReqHttpMinor,
    ReqLineAlmostDone,

    HeaderFieldStart,
    HeaderField,
    HeaderValueStart,
    HeaderValue,
    HeaderValueLws,

    HeaderAlmostDone,

    ChunkSizeStart,
    ChunkSize,
    ChunkParameters,
    ChunkSizeAlmostDone,

    HeadersAlmostDone,
    HeadersDone,

    ChunkData,
    ChunkDataAlmostDone,
    ChunkDataDone,

    BodyIdentity,
    BodyIdentityEof,

    MessageDone,
}

impl State {
    /// Bytes seen in these states count against the header-size bound.
    /// Everything from the start line up to and including the final
    /// header CRLF is the header region; chunk-size lines and trailers
    /// re-enter it.
    #[inline]
    pub(crate) const fn is_parsing_header(self) -> bool {
        !matches!(
            self,
            State::ChunkData
                | State::ChunkDataAlmostDone
                | State::ChunkDataDone
                | State::BodyIdentity
                | State::BodyIdentityEof
                | State::MessageDone
        )
    }

    /// States whose bytes belong to the request-target; an `execute` call
    /// entered in one of these re-arms the URL mark at the buffer base.
    #[inline]
    pub(crate) const fn is_url_data(self) -> bool {
        matches!(
            self,
            State::ReqSchema
                | State::ReqSchemaSlash
                | State::ReqSchemaSlashSlash
                | State::ReqHostStart
                | State::ReqHost
                | State::ReqHostIpv6
                | State::ReqHostDone
                | State::ReqPort
                | State::ReqPath
                | State::ReqQueryStringStart
                | State::ReqQueryString
                | State::ReqFragmentStart
                | State::ReqFragment
        )
    }
}

/// Sub-state while scanning a header line, tracking the fused lowercase
/// match against the three framing-relevant names and the quoted-string
/// tolerance inside opaque values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeaderState {
    General,

    GeneralAndQuote,
    GeneralAndQuoteAndEscape,

    MatchingContentLength,
    MatchingTransferEncoding,
    MatchingUpgrade,

    ContentLength,
    TransferEncoding,
    Upgrade,

    MatchingTransferEncodingChunked,

    TransferEncodingChunked,
}
