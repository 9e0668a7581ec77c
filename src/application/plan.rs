use http::header::HeaderMap;
use url::Url;
use crate::domain::{AbortSignal, Body, ExtractedBody, FetchError, RedirectMode, Request};
use crate::ports::ByteStream;
use super::{extract, multipart};

pub const MAX_REDIRECTS: u32 = 20;

/// Mutable state of one fetch invocation across redirect hops. The
/// extracted body stream is consumed once per send attempt; `original`
/// keeps whatever is replayable so a follow can rebuild the same bytes.
pub struct RequestPlan {
    pub url: Url,
    pub method: String,
    pub headers: HeaderMap,
    pub body: ExtractedBody,
    pub body_present: bool,
    pub original: Option<Body>,
    pub boundary: Option<String>,
    pub redirect: RedirectMode,
    pub signal: Option<AbortSignal>,
    pub redirect_count: u32,
}

impl RequestPlan {
    pub fn from_request(request: Request) -> Result<Self, FetchError> {
        let Request { url, method, headers, body, signal, redirect } = request;
        let mut plan = Self {
            url,
            method,
            headers,
            body: ExtractedBody::empty(),
            body_present: false,
            original: None,
            boundary: None,
            redirect,
            signal,
            redirect_count: 0,
        };
        plan.materialize(body)?;
        Ok(plan)
    }

    fn materialize(&mut self, body: Option<Body>) -> Result<(), FetchError> {
        if matches!(body, Some(Body::FormData(_))) && self.boundary.is_none() {
            self.boundary = Some(multipart::generate_boundary()?);
        }
        self.original = body.as_ref().and_then(Body::replay);
        self.body = extract::extract_with(body, self.boundary.as_deref())?;
        self.body_present = self.body.stream.is_some();
        Ok(())
    }

    /// Rebuilds the body stream from the replayable original. A form-data
    /// original is re-encoded against the boundary of the first send, so
    /// the re-sent bytes are identical.
    pub fn rematerialize(&mut self) -> Result<(), FetchError> {
        let original = self.original.take();
        self.materialize(original)
    }

    pub fn drop_body(&mut self) {
        self.body = ExtractedBody::empty();
        self.body_present = false;
        self.original = None;
        self.boundary = None;
    }

    pub fn take_stream(&mut self) -> Option<ByteStream> {
        self.body.stream.take()
    }
}
