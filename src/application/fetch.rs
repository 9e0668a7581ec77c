use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use bytes::Bytes;
use futures_core::Stream;
use http::header::{HeaderMap, HeaderValue, CONTENT_ENCODING, CONTENT_LENGTH, LOCATION};
use tracing::debug;
use crate::domain::{AbortSignal, FetchError, RedirectMode, Request, RequestInit, Response};
use crate::ports::{ByteStream, EngineRequest, EngineResponse, HttpEngine};
use super::config::Config;
use super::decode::decode_stream;
use super::headers::{finalize_request_headers, headers_from_raw};
use super::plan::{RequestPlan, MAX_REDIRECTS};

/// Drives requests through an HTTP engine: redirect handling, cancellation
/// propagation, request body wiring, response body decoding.
pub struct Client<E: HttpEngine> {
    engine: E,
    config: Config,
}

enum Hop {
    Follow,
    Deliver,
}

impl<E: HttpEngine> Client<E> {
    pub fn new(engine: E) -> Self {
        Self { engine, config: Config::default() }
    }

    pub fn with_config(engine: E, config: Config) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn fetch_url(&self, url: &str, init: RequestInit) -> Result<Response, FetchError> {
        self.fetch(Request::new(url, init)?).await
    }

    /// Applies `init` on top of an existing request, then executes it.
    /// `fetch_with(request, init)` observes the same behavior as building
    /// the request with those options in the first place.
    pub async fn fetch_with(&self, request: Request, init: RequestInit) -> Result<Response, FetchError> {
        self.fetch(request.apply(init)?).await
    }

    pub async fn fetch(&self, request: Request) -> Result<Response, FetchError> {
        let mut plan = RequestPlan::from_request(request)?;
        if let Some(reason) = plan.signal.as_ref().and_then(AbortSignal::aborted) {
            return Err(reason);
        }

        loop {
            finalize_request_headers(&mut plan.headers, &plan.method, &plan.body, &self.config.user_agent);
            let body = plan.take_stream().map(|s| guard(s, plan.signal.as_ref()));
            let engine_request = EngineRequest {
                method: plan.method.clone(),
                url: plan.url.clone(),
                headers: plan.headers.clone(),
                body,
            };
            debug!(url = %plan.url, method = %plan.method, "sending request");
            let response = self.send_abortable(engine_request, plan.signal.clone()).await?;
            let mut headers = headers_from_raw(&response.raw_headers);
            let status = response.status;

            if is_redirect(status) {
                let location = headers
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned);
                // A 3xx without Location is an ordinary response.
                if let Some(location) = location {
                    match redirect_hop(&mut plan, status, &location, &mut headers)? {
                        Hop::Follow => continue,
                        Hop::Deliver => {}
                    }
                }
            }
            return Ok(deliver(plan, status, headers, response.body));
        }
    }

    async fn send_abortable(
        &self,
        request: EngineRequest,
        signal: Option<AbortSignal>,
    ) -> Result<EngineResponse, FetchError> {
        match signal {
            Some(signal) => tokio::select! {
                reason = signal.cancelled() => Err(reason),
                response = self.engine.send(request) => response,
            },
            None => self.engine.send(request).await,
        }
    }
}

fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

fn redirect_hop(
    plan: &mut RequestPlan,
    status: u16,
    location: &str,
    headers: &mut HeaderMap,
) -> Result<Hop, FetchError> {
    let location_url = plan
        .url
        .join(location)
        .map_err(|e| FetchError::redirect(format!("invalid redirect location: {}", e)))?;

    match plan.redirect {
        RedirectMode::Error => Err(FetchError::redirect(
            "URI requested responds with a redirect, redirect mode is set to error",
        )),
        RedirectMode::Manual => {
            if let Ok(value) = HeaderValue::from_str(location_url.as_str()) {
                headers.insert(LOCATION, value);
            }
            Ok(Hop::Deliver)
        }
        RedirectMode::Follow => {
            plan.redirect_count += 1;
            if plan.redirect_count > MAX_REDIRECTS {
                return Err(FetchError::redirect(format!(
                    "maximum redirect reached at: {}",
                    plan.url
                )));
            }
            if !matches!(location_url.scheme(), "http" | "https") {
                return Err(FetchError::redirect("URL scheme must be a HTTP(S) scheme"));
            }
            if status == 303 || ((status == 301 || status == 302) && plan.method == "POST") {
                plan.method = "GET".to_string();
                plan.drop_body();
                plan.headers.remove(CONTENT_LENGTH);
            } else if plan.body_present && (plan.body.length.is_none() || plan.original.is_none()) {
                // One-shot streams cannot be replayed, known length or not.
                return Err(FetchError::redirect("Cannot follow redirect with a streamed body"));
            } else if plan.body_present {
                plan.rematerialize()?;
            }
            debug!(status, location = %location_url, "following redirect");
            plan.url = location_url;
            Ok(Hop::Follow)
        }
    }
}

fn deliver(plan: RequestPlan, status: u16, mut headers: HeaderMap, body: ByteStream) -> Response {
    let body = if plan.method == "HEAD" || status == 204 || status == 304 {
        // Null body; any Content-Encoding header stays exactly as reported.
        None
    } else {
        let stream = guard(body, plan.signal.as_ref());
        let encoding = headers
            .get(CONTENT_ENCODING)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase());
        match encoding {
            Some(encoding) => {
                if let Ok(value) = HeaderValue::from_str(&encoding) {
                    headers.insert(CONTENT_ENCODING, value);
                }
                Some(decode_stream(&encoding, stream))
            }
            None => Some(stream),
        }
    };
    Response::new(plan.url, status, headers, plan.redirect_count > 0, body)
}

fn guard(stream: ByteStream, signal: Option<&AbortSignal>) -> ByteStream {
    match signal {
        Some(signal) => {
            let signal = signal.clone();
            ByteStream::from_stream(AbortGuard {
                inner: stream,
                aborted: Box::pin(async move { signal.cancelled().await }),
                done: false,
            })
        }
        None => stream,
    }
}

/// Fails the wrapped stream with the signal's reason as soon as an abort is
/// observed, regardless of whether the inner stream has more data.
struct AbortGuard {
    inner: ByteStream,
    aborted: Pin<Box<dyn Future<Output = FetchError> + Send>>,
    done: bool,
}

impl Stream for AbortGuard {
    type Item = Result<Bytes, FetchError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        if let Poll::Ready(reason) = this.aborted.as_mut().poll(cx) {
            this.done = true;
            return Poll::Ready(Some(Err(reason)));
        }
        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(Err(e))) => {
                this.done = true;
                Poll::Ready(Some(Err(e)))
            }
            other => other,
        }
    }
}
