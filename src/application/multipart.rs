use std::fmt::Write;
use bytes::Bytes;
use ring::rand::{SecureRandom, SystemRandom};
use crate::domain::{FetchError, FormData, FormValue};
use crate::ports::ByteStream;

const CRLF: &[u8] = b"\r\n";

/// A form rendered as `multipart/form-data`: the boundary, the exact byte
/// length of the encoded stream, and the stream itself.
#[derive(Debug)]
pub struct EncodedMultipart {
    pub boundary: String,
    pub length: u64,
    pub stream: ByteStream,
}

/// `formdata-` followed by 16 lowercase hex chars from 8 bytes of
/// cryptographically strong randomness.
pub fn generate_boundary() -> Result<String, FetchError> {
    let mut raw = [0u8; 8];
    SystemRandom::new()
        .fill(&mut raw)
        .map_err(|_| FetchError::other("failed to gather boundary randomness"))?;
    let mut boundary = String::with_capacity(9 + 16);
    boundary.push_str("formdata-");
    for byte in raw {
        let _ = write!(&mut boundary, "{:02x}", byte);
    }
    Ok(boundary)
}

/// Encodes the form against a fixed boundary. Re-encoding the same form
/// with the same boundary yields byte-identical output, which is what
/// redirect replays rely on.
///
/// Names and filenames are written verbatim; callers are trusted to supply
/// values safe for header inclusion.
pub fn encode_with_boundary(form: &FormData, boundary: &str) -> EncodedMultipart {
    let footer = footer(boundary);
    let mut segments: Vec<ByteStream> = Vec::with_capacity(form.entries().len() * 2 + 1);
    let mut length = footer.len() as u64;

    for (name, value) in form.entries() {
        let header = part_header(boundary, name, value);
        length += header.len() as u64 + value_length(value) + CRLF.len() as u64;
        match value {
            FormValue::Text(text) => {
                let mut chunk = header.into_bytes();
                chunk.extend_from_slice(text.as_bytes());
                chunk.extend_from_slice(CRLF);
                segments.push(ByteStream::once(Bytes::from(chunk)));
            }
            FormValue::Blob(blob) => {
                segments.push(ByteStream::once(Bytes::from(header.into_bytes())));
                segments.push(blob.stream());
                segments.push(ByteStream::once(Bytes::from_static(CRLF)));
            }
        }
    }
    segments.push(ByteStream::once(Bytes::from(footer.into_bytes())));

    EncodedMultipart {
        boundary: boundary.to_string(),
        length,
        stream: ByteStream::concat(segments),
    }
}

pub fn encode(form: &FormData) -> Result<EncodedMultipart, FetchError> {
    let boundary = generate_boundary()?;
    Ok(encode_with_boundary(form, &boundary))
}

fn part_header(boundary: &str, name: &str, value: &FormValue) -> String {
    let mut header = format!("--{}\r\nContent-Disposition: form-data; name=\"{}\"", boundary, name);
    if let FormValue::Blob(blob) = value {
        let filename = blob.name().unwrap_or("blob");
        let content_type = if blob.content_type().is_empty() {
            "application/octet-stream"
        } else {
            blob.content_type()
        };
        let _ = write!(&mut header, "; filename=\"{}\"\r\nContent-Type: {}", filename, content_type);
    }
    header.push_str("\r\n\r\n");
    header
}

fn value_length(value: &FormValue) -> u64 {
    match value {
        FormValue::Text(text) => text.len() as u64,
        FormValue::Blob(blob) => blob.size(),
    }
}

fn footer(boundary: &str) -> String {
    format!("--{}--\r\n\r\n", boundary)
}
