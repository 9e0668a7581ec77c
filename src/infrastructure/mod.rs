mod dns;
mod engine;
mod tls;

pub use dns::HickoryDnsResolver;
pub use engine::NativeEngine;
pub use tls::{MaybeTlsStream, RustlsHandshaker};
