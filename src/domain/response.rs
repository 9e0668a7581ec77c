use http::header::HeaderMap;
use http::StatusCode;
use url::Url;
use crate::domain::FetchError;
use crate::ports::ByteStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Basic,
    Cors,
    Default,
    Error,
    Opaque,
    OpaqueRedirect,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Default => "default",
            ResponseType::Error => "error",
            ResponseType::Opaque => "opaque",
            ResponseType::OpaqueRedirect => "opaqueredirect",
        }
    }
}

/// Final outcome of a fetch. The body is lazy: nothing is read from the
/// wire until a consumer drains it, so transport and decode failures after
/// the header section surface from `bytes()`/`text()`, not from `fetch`.
#[derive(Debug)]
pub struct Response {
    url: Url,
    status: u16,
    status_text: String,
    headers: HeaderMap,
    redirected: bool,
    response_type: ResponseType,
    body: Option<ByteStream>,
}

impl Response {
    pub(crate) fn new(
        url: Url,
        status: u16,
        headers: HeaderMap,
        redirected: bool,
        body: Option<ByteStream>,
    ) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string();
        Self {
            url,
            status,
            status_text,
            headers,
            redirected,
            response_type: ResponseType::Default,
            body,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn redirected(&self) -> bool {
        self.redirected
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Takes the body stream for manual consumption. Subsequent calls
    /// return `None`.
    pub fn take_body(&mut self) -> Option<ByteStream> {
        self.body.take()
    }

    /// Drains the body to a single buffer. A null body yields zero bytes.
    pub async fn bytes(mut self) -> Result<bytes::Bytes, FetchError> {
        match self.body.take() {
            Some(stream) => stream.collect().await,
            None => Ok(bytes::Bytes::new()),
        }
    }

    /// Drains the body and decodes it as UTF-8, replacing invalid
    /// sequences.
    pub async fn text(self) -> Result<String, FetchError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("http://example.com/").unwrap()
    }

    #[tokio::test]
    async fn null_body_reads_as_empty_text() {
        let response = Response::new(url(), 204, HeaderMap::new(), false, None);
        assert!(!response.has_body());
        assert_eq!(response.text().await.unwrap(), "");
    }

    #[tokio::test]
    async fn body_text_round_trips() {
        let body = ByteStream::once(bytes::Bytes::from_static(b"hello world"));
        let response = Response::new(url(), 200, HeaderMap::new(), false, Some(body));
        assert!(response.ok());
        assert_eq!(response.status_text(), "OK");
        assert_eq!(response.text().await.unwrap(), "hello world");
    }

    #[test]
    fn type_is_forced_to_default() {
        let response = Response::new(url(), 302, HeaderMap::new(), true, None);
        assert_eq!(response.response_type(), ResponseType::Default);
        assert_eq!(response.response_type().as_str(), "default");
        assert!(response.redirected());
    }
}
