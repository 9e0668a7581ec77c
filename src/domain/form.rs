use bytes::Bytes;
use crate::domain::FetchError;
use crate::ports::ByteStream;

/// Immutable byte payload with an optional MIME type and an optional file
/// name. A named blob is what the web platform calls a `File`.
#[derive(Debug, Clone, Default)]
pub struct Blob {
    bytes: Bytes,
    content_type: String,
    name: Option<String>,
}

impl Blob {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self { bytes: bytes.into(), content_type: content_type.into(), name: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn stream(&self) -> ByteStream {
        if self.bytes.is_empty() {
            ByteStream::empty()
        } else {
            ByteStream::once(self.bytes.clone())
        }
    }
}

#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    Blob(Blob),
}

/// Ordered multipart form entries. Entry order is wire order.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), FormValue::Text(value.into())));
    }

    pub fn append_blob(&mut self, name: impl Into<String>, blob: Blob) {
        self.entries.push((name.into(), FormValue::Blob(blob)));
    }

    pub fn entries(&self) -> &[(String, FormValue)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered key-value pairs rendered as `application/x-www-form-urlencoded`.
#[derive(Debug, Clone, Default)]
pub struct UrlSearchParams {
    pairs: Vec<(String, String)>,
}

impl UrlSearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    pub fn serialize(&self) -> String {
        let mut out = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.pairs {
            out.append_pair(name, value);
        }
        out.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UrlSearchParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// A pre-assembled multipart body carrying its own boundary. Not
/// replayable: once the stream is consumed it cannot be rebuilt.
#[derive(Debug)]
pub struct MultipartStream {
    pub boundary: String,
    pub length: Option<u64>,
    pub stream: ByteStream,
}

impl MultipartStream {
    pub fn new(boundary: impl Into<String>, length: Option<u64>, stream: ByteStream) -> Result<Self, FetchError> {
        let boundary = boundary.into();
        if boundary.is_empty() {
            return Err(FetchError::input("multipart boundary must not be empty"));
        }
        Ok(Self { boundary, length, stream })
    }
}
