mod abort;
mod body;
mod error;
mod form;
mod redirect;
mod request;
mod response;

pub use abort::{AbortController, AbortSignal, DEFAULT_ABORT_MESSAGE};
pub use body::{Body, ExtractedBody};
pub use error::{ErrorClass, FetchError};
pub use form::{Blob, FormData, FormValue, MultipartStream, UrlSearchParams};
pub use redirect::RedirectMode;
pub use request::{check_scheme, normalize_method, parse_url, Request, RequestInit};
pub use response::{Response, ResponseType};
