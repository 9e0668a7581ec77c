pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{Client, Config};
pub use domain::{
    AbortController, AbortSignal, Blob, Body, ErrorClass, FetchError, FormData, FormValue,
    MultipartStream, RedirectMode, Request, RequestInit, Response, ResponseType, UrlSearchParams,
};
pub use infrastructure::NativeEngine;
pub use ports::{ByteStream, EngineRequest, EngineResponse, HttpEngine};

/// One-shot fetch over the native HTTP/1.1 engine.
pub async fn fetch(url: &str, init: RequestInit) -> Result<Response, FetchError> {
    let request = Request::new(url, init)?;
    Client::new(NativeEngine::new()).fetch(request).await
}
