use std::pin::Pin;
use std::task::{Context, Poll};
use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::StreamExt;
use crate::domain::FetchError;

/// Pull-based, single-consumer byte source. Fronts both request and
/// response bodies; chunks are delivered in wire order.
pub struct ByteStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, FetchError>> + Send>>,
}

impl ByteStream {
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, FetchError>> + Send + 'static,
    {
        Self { inner: Box::pin(stream) }
    }

    pub fn empty() -> Self {
        Self::from_stream(futures_util::stream::empty())
    }

    pub fn once(chunk: Bytes) -> Self {
        Self::from_stream(futures_util::stream::once(std::future::ready(Ok(chunk))))
    }

    pub fn from_iter<I>(chunks: I) -> Self
    where
        I: IntoIterator + Send + 'static,
        I::IntoIter: Send + 'static,
        I::Item: Into<Bytes>,
    {
        Self::from_stream(futures_util::stream::iter(
            chunks.into_iter().map(|c| Ok(c.into())),
        ))
    }

    /// Emits the given segments back to back, draining each in turn.
    pub fn concat(segments: Vec<ByteStream>) -> Self {
        Self::from_stream(futures_util::stream::iter(segments).flatten())
    }

    pub async fn next_chunk(&mut self) -> Option<Result<Bytes, FetchError>> {
        self.next().await
    }

    /// Drains the stream into a single buffer. Errors buffered anywhere in
    /// the stream surface here, which is where decode failures become
    /// visible to body consumers.
    pub async fn collect(mut self) -> Result<Bytes, FetchError> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

impl Stream for ByteStream {
    type Item = Result<Bytes, FetchError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ByteStream")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_yields_no_chunks() {
        let mut s = ByteStream::empty();
        assert!(s.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn once_yields_single_chunk() {
        let collected = ByteStream::once(Bytes::from_static(b"abc")).collect().await.unwrap();
        assert_eq!(&collected[..], b"abc");
    }

    #[tokio::test]
    async fn from_iter_preserves_order() {
        let s = ByteStream::from_iter(vec![&b"a"[..], &b"b"[..], &b"c"[..]]);
        assert_eq!(&s.collect().await.unwrap()[..], b"abc");
    }

    #[tokio::test]
    async fn concat_chains_segments() {
        let s = ByteStream::concat(vec![
            ByteStream::once(Bytes::from_static(b"he")),
            ByteStream::empty(),
            ByteStream::once(Bytes::from_static(b"llo")),
        ]);
        assert_eq!(&s.collect().await.unwrap()[..], b"hello");
    }

    #[tokio::test]
    async fn collect_surfaces_buffered_error() {
        let s = ByteStream::from_stream(futures_util::stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(FetchError::decode("truncated")),
        ]));
        let err = s.collect().await.unwrap_err();
        assert_eq!(err.message, "truncated");
    }
}
