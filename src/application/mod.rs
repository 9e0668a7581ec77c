mod config;
mod decode;
mod extract;
mod fetch;
mod headers;
mod multipart;
mod plan;

pub use config::Config;
pub use decode::decode_stream;
pub use extract::{extract, FORM_CONTENT_TYPE, TEXT_CONTENT_TYPE};
pub use fetch::Client;
pub use headers::{finalize_request_headers, headers_from_raw};
pub use multipart::{encode as encode_multipart, generate_boundary, EncodedMultipart};
pub use plan::{RequestPlan, MAX_REDIRECTS};
