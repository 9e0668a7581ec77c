use http::header::HeaderMap;
use url::Url;
use crate::domain::FetchError;
use super::stream::ByteStream;

/// One wire exchange handed to the engine. Headers are final: the engine
/// sends them as-is, only synthesizing connection-level headers (Host)
/// that depend on the transport.
#[derive(Debug)]
pub struct EngineRequest {
    pub method: String,
    pub url: Url,
    pub headers: HeaderMap,
    /// `None` closes the request stream immediately. A present stream is
    /// piped until exhaustion; stream errors abort the exchange.
    pub body: Option<ByteStream>,
}

/// Raw engine response: status, the header pairs exactly as received (order
/// and duplicates preserved), and the undecoded body stream.
#[derive(Debug)]
pub struct EngineResponse {
    pub status: u16,
    pub version: String,
    pub raw_headers: Vec<(String, String)>,
    pub body: ByteStream,
}

/// Abstract HTTP transport. Implementations own connection establishment
/// and HTTP framing (including chunked transfer decoding) and must not
/// apply a read timeout to the response body stream.
pub trait HttpEngine: Send + Sync {
    fn send(
        &self,
        request: EngineRequest,
    ) -> impl std::future::Future<Output = Result<EngineResponse, FetchError>> + Send;
}
