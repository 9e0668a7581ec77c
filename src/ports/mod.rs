mod engine;
mod stream;

pub use engine::{EngineRequest, EngineResponse, HttpEngine};
pub use stream::ByteStream;
