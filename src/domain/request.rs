use http::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;
use crate::domain::{AbortSignal, Body, FetchError, RedirectMode};

const FORBIDDEN_METHODS: [&str; 3] = ["CONNECT", "TRACE", "TRACK"];

pub fn parse_url(input: &str) -> Result<Url, FetchError> {
    let url = Url::parse(input).map_err(|_| FetchError::input(format!("Invalid URL: {}", input)))?;
    check_scheme(&url)?;
    Ok(url)
}

pub fn check_scheme(url: &Url) -> Result<(), FetchError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FetchError::input(format!(
            "URL scheme \"{}:\" is not supported.",
            other
        ))),
    }
}

pub fn normalize_method(method: &str) -> Result<String, FetchError> {
    let upper = method.to_ascii_uppercase();
    if FORBIDDEN_METHODS.contains(&upper.as_str()) {
        return Err(FetchError::input(format!(
            "Failed to construct 'Request': '{}' HTTP method is unsupported.",
            upper
        )));
    }
    Ok(upper)
}

/// Per-call options. Every field overrides the corresponding `Request`
/// field when set.
#[derive(Debug, Default)]
pub struct RequestInit {
    pub method: Option<String>,
    pub headers: Option<Vec<(String, String)>>,
    pub body: Option<Body>,
    pub signal: Option<AbortSignal>,
    pub redirect: Option<RedirectMode>,
}

impl RequestInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.get_or_insert_with(Vec::new).push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn redirect(mut self, mode: RedirectMode) -> Self {
        self.redirect = Some(mode);
        self
    }
}

/// A validated request: HTTP(S) URL, canonical uppercase method, redirect
/// policy, optional body and cancellation signal.
#[derive(Debug)]
pub struct Request {
    pub url: Url,
    pub method: String,
    pub headers: HeaderMap,
    pub body: Option<Body>,
    pub signal: Option<AbortSignal>,
    pub redirect: RedirectMode,
}

impl Request {
    pub fn new(url: &str, init: RequestInit) -> Result<Self, FetchError> {
        let url = parse_url(url)?;
        let request = Self {
            url,
            method: "GET".to_string(),
            headers: HeaderMap::new(),
            body: None,
            signal: None,
            redirect: RedirectMode::Follow,
        };
        request.apply(init)
    }

    pub fn get(url: &str) -> Result<Self, FetchError> {
        Self::new(url, RequestInit::new())
    }

    /// Applies init options on top of this request, field by field.
    /// Provided headers replace the existing value for their key and leave
    /// other keys untouched.
    pub fn apply(mut self, init: RequestInit) -> Result<Self, FetchError> {
        if let Some(method) = init.method {
            self.method = normalize_method(&method)?;
        }
        if let Some(pairs) = init.headers {
            for (name, value) in pairs {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| FetchError::input(format!("invalid header name: {}", name)))?;
                let value = HeaderValue::from_str(&value)
                    .map_err(|_| FetchError::input(format!("invalid header value for {}", name)))?;
                self.headers.insert(name, value);
            }
        }
        if let Some(body) = init.body {
            self.body = Some(body);
        }
        if let Some(signal) = init.signal {
            self.signal = Some(signal);
        }
        if let Some(redirect) = init.redirect {
            self.redirect = redirect;
        }
        Ok(self)
    }
}
