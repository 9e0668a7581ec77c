use bytes::Bytes;
use futures_core::Stream;
use crate::domain::{Blob, FetchError, FormData, MultipartStream, UrlSearchParams};
use crate::ports::ByteStream;

/// Polymorphic request body input. Buffered variants can be replayed across
/// redirects; stream variants are one-shot.
#[derive(Debug)]
pub enum Body {
    Text(String),
    Bytes(Bytes),
    Blob(Blob),
    Form(UrlSearchParams),
    FormData(FormData),
    Multipart(MultipartStream),
    Stream(ByteStream),
}

impl Body {
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, FetchError>> + Send + 'static,
    {
        Body::Stream(ByteStream::from_stream(stream))
    }

    pub fn from_iter<I>(chunks: I) -> Self
    where
        I: IntoIterator + Send + 'static,
        I::IntoIter: Send + 'static,
        I::Item: Into<Bytes>,
    {
        Body::Stream(ByteStream::from_iter(chunks))
    }

    /// A clone suitable for re-sending the same bytes on a redirect, or
    /// `None` for one-shot stream bodies.
    pub fn replay(&self) -> Option<Body> {
        match self {
            Body::Text(s) => Some(Body::Text(s.clone())),
            Body::Bytes(b) => Some(Body::Bytes(b.clone())),
            Body::Blob(b) => Some(Body::Blob(b.clone())),
            Body::Form(f) => Some(Body::Form(f.clone())),
            Body::FormData(f) => Some(Body::FormData(f.clone())),
            Body::Multipart(_) | Body::Stream(_) => None,
        }
    }
}

impl From<String> for Body {
    fn from(value: String) -> Self {
        Body::Text(value)
    }
}

impl From<&str> for Body {
    fn from(value: &str) -> Self {
        Body::Text(value.to_string())
    }
}

impl From<Bytes> for Body {
    fn from(value: Bytes) -> Self {
        Body::Bytes(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(value: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(value))
    }
}

impl From<&[u8]> for Body {
    fn from(value: &[u8]) -> Self {
        Body::Bytes(Bytes::copy_from_slice(value))
    }
}

impl From<Blob> for Body {
    fn from(value: Blob) -> Self {
        Body::Blob(value)
    }
}

impl From<UrlSearchParams> for Body {
    fn from(value: UrlSearchParams) -> Self {
        Body::Form(value)
    }
}

impl From<FormData> for Body {
    fn from(value: FormData) -> Self {
        Body::FormData(value)
    }
}

/// Uniform output of body extraction.
///
/// `stream` is `None` exactly when there are no bytes to send; a concrete
/// `length` means the stream emits exactly that many bytes over its
/// lifetime. `content_type` is set only when the extractor synthesized the
/// representation.
#[derive(Debug)]
pub struct ExtractedBody {
    pub stream: Option<ByteStream>,
    pub length: Option<u64>,
    pub content_type: Option<String>,
}

impl ExtractedBody {
    pub fn empty() -> Self {
        Self { stream: None, length: None, content_type: None }
    }

    pub fn is_present(&self) -> bool {
        self.stream.is_some()
    }
}
