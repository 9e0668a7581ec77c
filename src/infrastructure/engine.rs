use std::net::SocketAddr;
use bytes::Bytes;
use futures_util::StreamExt;
use http::header::{HeaderValue, CONNECTION, HOST};
use http::{Method, Uri};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, BodyStream, Empty, StreamBody};
use hyper::body::Frame;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;
use crate::domain::FetchError;
use crate::ports::{ByteStream, EngineRequest, EngineResponse, HttpEngine};
use super::dns::HickoryDnsResolver;
use super::tls::{MaybeTlsStream, RustlsHandshaker};

/// HTTP/1.1 engine over native sockets: hickory DNS, tokio TCP, rustls
/// TLS, hyper framing. One connection per exchange (`Connection: close`);
/// no timeout is applied to the response body.
pub struct NativeEngine {
    dns: HickoryDnsResolver,
    tls: RustlsHandshaker,
}

impl NativeEngine {
    pub fn new() -> Self {
        Self {
            dns: HickoryDnsResolver::new(),
            tls: RustlsHandshaker::new(),
        }
    }

    async fn connect(&self, url: &Url) -> Result<MaybeTlsStream, FetchError> {
        let host = url
            .host_str()
            .ok_or_else(|| FetchError::input(format!("missing host in URL: {}", url)))?;
        let is_https = url.scheme() == "https";
        let port = url.port_or_known_default().unwrap_or(if is_https { 443 } else { 80 });

        let ips = self.dns.resolve(host).await?;
        let ip = ips
            .first()
            .copied()
            .ok_or_else(|| FetchError::transport(format!("no IP addresses for {}", host)))?;

        debug!(%host, %ip, port, "connecting");
        let addr = SocketAddr::new(ip, port);
        let stream = TcpStream::connect(addr).await.map_err(|e| {
            let msg = match e.kind() {
                std::io::ErrorKind::ConnectionRefused => format!("connection refused: {}:{}", ip, port),
                std::io::ErrorKind::TimedOut => format!("connection timed out: {}:{}", ip, port),
                _ => format!("TCP connect failed to {}:{}: {}", ip, port, e),
            };
            FetchError::transport(msg)
        })?;

        if is_https {
            let sni = host.trim_start_matches('[').trim_end_matches(']');
            self.tls.handshake(stream, sni).await
        } else {
            Ok(MaybeTlsStream::Plain(stream))
        }
    }
}

impl Default for NativeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpEngine for NativeEngine {
    async fn send(&self, request: EngineRequest) -> Result<EngineResponse, FetchError> {
        let stream = self.connect(&request.url).await?;
        let io = TokioIo::new(stream);
        let (mut sender, conn) = http1::handshake::<_, UnsyncBoxBody<Bytes, FetchError>>(io)
            .await
            .map_err(|e| FetchError::transport(format!("HTTP handshake failed: {}", e)))?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "connection task ended with error");
            }
        });

        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| FetchError::input(format!("invalid HTTP method: {}", request.method)))?;
        let uri: Uri = origin_form(&request.url)
            .parse()
            .map_err(|_| FetchError::input(format!("invalid request target in URL: {}", request.url)))?;
        let body: UnsyncBoxBody<Bytes, FetchError> = match request.body {
            Some(stream) => {
                BodyExt::boxed_unsync(StreamBody::new(stream.map(|chunk| chunk.map(Frame::data))))
            }
            None => BodyExt::boxed_unsync(Empty::<Bytes>::new().map_err(|err| match err {})),
        };

        let mut outgoing = hyper::Request::builder()
            .method(method)
            .uri(uri)
            .body(body)
            .map_err(|e| FetchError::transport(format!("failed to build request: {}", e)))?;
        *outgoing.headers_mut() = request.headers;
        if !outgoing.headers().contains_key(HOST) {
            if let Ok(value) = HeaderValue::from_str(&host_header(&request.url)) {
                outgoing.headers_mut().insert(HOST, value);
            }
        }
        if !outgoing.headers().contains_key(CONNECTION) {
            outgoing.headers_mut().insert(CONNECTION, HeaderValue::from_static("close"));
        }

        let response = sender
            .send_request(outgoing)
            .await
            .map_err(|e| FetchError::transport(format!("request failed: {}", e)))?;

        let (parts, incoming) = response.into_parts();
        let mut raw_headers = Vec::with_capacity(parts.headers.len());
        for (name, value) in parts.headers.iter() {
            raw_headers.push((
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            ));
        }

        let body = ByteStream::from_stream(BodyStream::new(incoming).filter_map(|frame| {
            std::future::ready(match frame {
                Ok(frame) => frame.into_data().ok().map(Ok),
                Err(e) => Some(Err(FetchError::transport(format!("response body error: {}", e)))),
            })
        }));

        Ok(EngineResponse {
            status: parts.status.as_u16(),
            version: format!("{:?}", parts.version),
            raw_headers,
            body,
        })
    }
}

fn origin_form(url: &Url) -> String {
    let path = if url.path().is_empty() { "/" } else { url.path() };
    match url.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    }
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    let is_https = url.scheme() == "https";
    let port = url.port_or_known_default().unwrap_or(if is_https { 443 } else { 80 });
    if (is_https && port == 443) || (!is_https && port == 80) {
        host.to_string()
    } else {
        format!("{}:{}", host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_form_includes_query() {
        let url = Url::parse("http://example.com/a/b?x=1&y=2").unwrap();
        assert_eq!(origin_form(&url), "/a/b?x=1&y=2");
        let url = Url::parse("http://example.com").unwrap();
        assert_eq!(origin_form(&url), "/");
    }

    #[test]
    fn host_header_elides_default_ports() {
        assert_eq!(host_header(&Url::parse("http://example.com/").unwrap()), "example.com");
        assert_eq!(host_header(&Url::parse("https://example.com:443/").unwrap()), "example.com");
        assert_eq!(host_header(&Url::parse("http://example.com:8080/").unwrap()), "example.com:8080");
        assert_eq!(host_header(&Url::parse("http://127.0.0.1:3000/").unwrap()), "127.0.0.1:3000");
    }
}
