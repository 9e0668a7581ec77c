use bytes::Bytes;
use crate::domain::{Body, ExtractedBody, FetchError};
use crate::ports::ByteStream;
use super::multipart;

pub const TEXT_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// Classifies a body input into the uniform `(stream, length, type)`
/// triple. Pure: stream construction is lazy, no I/O happens here.
///
/// A content type is synthesized only for text, url-encoded form, and
/// multipart bodies; raw buffers and opaque streams carry none. Inputs
/// with zero bytes yield no stream and length 0.
pub fn extract(body: Option<Body>) -> Result<ExtractedBody, FetchError> {
    extract_with(body, None)
}

/// Like `extract`, but a form-data body is encoded against the given
/// boundary instead of a fresh one. Redirect replays use this to
/// re-materialize the same bytes the first send produced.
pub fn extract_with(body: Option<Body>, boundary: Option<&str>) -> Result<ExtractedBody, FetchError> {
    let body = match body {
        Some(body) => body,
        None => return Ok(ExtractedBody::empty()),
    };

    Ok(match body {
        Body::Text(text) => buffered(Bytes::from(text.into_bytes()), Some(TEXT_CONTENT_TYPE.to_string())),
        Body::Form(params) => buffered(
            Bytes::from(params.serialize().into_bytes()),
            Some(FORM_CONTENT_TYPE.to_string()),
        ),
        Body::Blob(blob) => {
            let content_type = match blob.content_type() {
                "" => None,
                t => Some(t.to_string()),
            };
            let length = blob.size();
            ExtractedBody {
                stream: if length == 0 { None } else { Some(blob.stream()) },
                length: Some(length),
                content_type,
            }
        }
        Body::Bytes(bytes) => buffered(bytes, None),
        Body::FormData(form) => {
            let encoded = match boundary {
                Some(boundary) => multipart::encode_with_boundary(&form, boundary),
                None => multipart::encode(&form)?,
            };
            ExtractedBody {
                stream: Some(encoded.stream),
                length: Some(encoded.length),
                content_type: Some(format!("multipart/form-data; boundary={}", encoded.boundary)),
            }
        }
        Body::Multipart(multipart) => ExtractedBody {
            content_type: Some(format!("multipart/form-data; boundary={}", multipart.boundary)),
            length: multipart.length,
            stream: Some(multipart.stream),
        },
        Body::Stream(stream) => ExtractedBody {
            stream: Some(stream),
            length: None,
            content_type: None,
        },
    })
}

fn buffered(bytes: Bytes, content_type: Option<String>) -> ExtractedBody {
    let length = bytes.len() as u64;
    ExtractedBody {
        stream: if bytes.is_empty() { None } else { Some(ByteStream::once(bytes)) },
        length: Some(length),
        content_type,
    }
}
