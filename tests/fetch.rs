use std::io::Write;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use ufetch::{Client, Config, FormData, NativeEngine, RequestInit};

fn client() -> Client<NativeEngine> {
    let config = Config { timeout: None, user_agent: "ufetch/0.2".to_string() };
    Client::with_config(NativeEngine::new(), config)
}

fn gzip_bytes(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn http_response(status_line: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut head = format!("HTTP/1.1 {}\r\n", status_line);
    for (name, value) in headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str(&format!("content-length: {}\r\nconnection: close\r\n\r\n", body.len()));
    let mut bytes = head.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

fn route(method: &str, target: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    match (method, target) {
        ("GET", "/hello") => http_response("200 OK", &[("content-type", "text/plain")], b"hello world"),
        ("GET", "/gzip") => http_response(
            "200 OK",
            &[("content-encoding", "gzip")],
            &gzip_bytes(b"hello world"),
        ),
        ("POST", "/form") => http_response("302 Found", &[("location", "/inspect")], b""),
        ("POST", "/form307") => http_response("307 Temporary Redirect", &[("location", "/inspect")], b""),
        (_, "/inspect") => {
            let echoed = format!(
                "method={}; content-type={}; body={}",
                method,
                content_type,
                String::from_utf8_lossy(body)
            );
            http_response("200 OK", &[], echoed.as_bytes())
        }
        _ => http_response("404 Not Found", &[], b"not found"),
    }
}

async fn handle(mut socket: TcpStream) {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];
    let header_end = loop {
        let n = match socket.read(&mut tmp).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&tmp[..n]);
        if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
            break pos;
        }
        if buf.len() > 64 * 1024 {
            return;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default().to_string();
    let mut content_length = 0usize;
    let mut content_type = String::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                "content-type" => content_type = value.trim().to_string(),
                _ => {}
            }
        }
    }

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = match socket.read(&mut tmp).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        body.extend_from_slice(&tmp[..n]);
    }

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let target = parts.next().unwrap_or("").to_string();

    let response = route(&method, &target, &content_type, &body);
    let _ = socket.write_all(&response).await;
    let _ = socket.shutdown().await;
}

async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(handle(socket));
                }
                Err(_) => break,
            }
        }
    });
    addr
}

#[tokio::test]
async fn plain_get_end_to_end() {
    let addr = spawn_server().await;
    let response = client()
        .fetch_url(&format!("http://{}/hello", addr), RequestInit::new())
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.ok());
    assert!(!response.redirected());
    assert_eq!(response.text().await.unwrap(), "hello world");
}

#[tokio::test]
async fn gzip_body_is_transparently_decoded() {
    let addr = spawn_server().await;
    let response = client()
        .fetch_url(&format!("http://{}/gzip", addr), RequestInit::new())
        .await
        .unwrap();
    assert_eq!(response.headers().get("content-encoding").unwrap(), "gzip");
    assert_eq!(response.text().await.unwrap(), "hello world");
}

#[tokio::test]
async fn post_through_302_arrives_as_get_without_body() {
    let addr = spawn_server().await;
    let response = client()
        .fetch_url(
            &format!("http://{}/form", addr),
            RequestInit::new().method("POST").body("a=1"),
        )
        .await
        .unwrap();
    assert!(response.redirected());
    assert!(response.url().as_str().ends_with("/inspect"));
    assert_eq!(response.text().await.unwrap(), "method=GET; content-type=; body=");
}

#[tokio::test]
async fn post_through_307_replays_method_and_body() {
    let addr = spawn_server().await;
    let response = client()
        .fetch_url(
            &format!("http://{}/form307", addr),
            RequestInit::new().method("POST").body("a=1"),
        )
        .await
        .unwrap();
    assert!(response.redirected());
    let text = response.text().await.unwrap();
    assert!(text.starts_with("method=POST;"));
    assert!(text.ends_with("body=a=1"));
}

#[tokio::test]
async fn multipart_form_posts_with_boundary_and_exact_bytes() {
    let addr = spawn_server().await;
    let mut form = FormData::new();
    form.append_text("a", "1");
    let response = client()
        .fetch_url(
            &format!("http://{}/inspect", addr),
            RequestInit::new().method("POST").body(form),
        )
        .await
        .unwrap();
    let text = response.text().await.unwrap();
    assert!(text.contains("content-type=multipart/form-data; boundary=formdata-"));
    assert!(text.contains("Content-Disposition: form-data; name=\"a\""));
    assert!(text.contains("\r\n\r\n1\r\n"));
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client()
        .fetch_url(&format!("http://{}/", addr), RequestInit::new())
        .await
        .unwrap_err();
    assert_eq!(err.class, ufetch::ErrorClass::Transport);
}
