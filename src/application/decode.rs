use std::io::Write;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use bytes::Bytes;
use flate2::write::{DeflateDecoder, GzDecoder, ZlibDecoder};
use futures_core::Stream;
use crate::domain::FetchError;
use crate::ports::ByteStream;

/// Wraps a byte stream in the decoding transform named by a
/// `Content-Encoding` value. Unknown encodings pass through unchanged.
///
/// `deflate` commits to zlib-wrapped or raw only after seeing the first
/// byte of the first non-empty chunk: a low nibble of `0x8` is a zlib
/// header, anything else is raw deflate.
pub fn decode_stream(encoding: &str, upstream: ByteStream) -> ByteStream {
    let state = match encoding.to_ascii_lowercase().as_str() {
        "gzip" | "x-gzip" => DecodeState::Running(Inflater::gzip()),
        "br" => DecodeState::Running(Inflater::brotli()),
        "deflate" | "x-deflate" => DecodeState::Sniffing,
        _ => return upstream,
    };
    ByteStream::from_stream(DecodeStream { upstream, state })
}

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

enum Inflater {
    Gzip { decoder: GzDecoder<SharedBuf>, out: SharedBuf },
    Zlib { decoder: ZlibDecoder<SharedBuf>, out: SharedBuf },
    Raw { decoder: DeflateDecoder<SharedBuf>, out: SharedBuf },
    Brotli { decoder: Box<brotli::DecompressorWriter<SharedBuf>>, out: SharedBuf },
}

impl Inflater {
    fn gzip() -> Self {
        let out = SharedBuf::default();
        Inflater::Gzip { decoder: GzDecoder::new(out.clone()), out }
    }

    fn brotli() -> Self {
        let out = SharedBuf::default();
        Inflater::Brotli { decoder: Box::new(brotli::DecompressorWriter::new(out.clone(), 4096)), out }
    }

    fn for_deflate(first_byte: u8) -> Self {
        let out = SharedBuf::default();
        if first_byte & 0x0f == 0x08 {
            Inflater::Zlib { decoder: ZlibDecoder::new(out.clone()), out }
        } else {
            Inflater::Raw { decoder: DeflateDecoder::new(out.clone()), out }
        }
    }

    fn feed(&mut self, chunk: &[u8]) -> Result<Bytes, FetchError> {
        match self {
            Inflater::Gzip { decoder, .. } => decoder
                .write_all(chunk)
                .map_err(|e| FetchError::decode(format!("gzip decode error: {}", e)))?,
            Inflater::Zlib { decoder, .. } => decoder
                .write_all(chunk)
                .map_err(|e| FetchError::decode(format!("deflate decode error: {}", e)))?,
            Inflater::Raw { decoder, .. } => decoder
                .write_all(chunk)
                .map_err(|e| FetchError::decode(format!("deflate decode error: {}", e)))?,
            Inflater::Brotli { decoder, .. } => decoder
                .write_all(chunk)
                .map_err(|e| FetchError::decode(format!("brotli decode error: {}", e)))?,
        }
        Ok(Bytes::from(self.out_buf().take()))
    }

    // Trailer and truncation errors at end of stream are swallowed:
    // already-decoded output must survive a stream that is cut short after
    // its last content byte.
    fn finish(mut self) -> Bytes {
        match &mut self {
            Inflater::Gzip { decoder, .. } => { let _ = decoder.try_finish(); }
            Inflater::Zlib { decoder, .. } => { let _ = decoder.try_finish(); }
            Inflater::Raw { decoder, .. } => { let _ = decoder.try_finish(); }
            Inflater::Brotli { decoder, .. } => { let _ = decoder.flush(); }
        }
        Bytes::from(self.out_buf().take())
    }

    fn out_buf(&self) -> &SharedBuf {
        match self {
            Inflater::Gzip { out, .. }
            | Inflater::Zlib { out, .. }
            | Inflater::Raw { out, .. }
            | Inflater::Brotli { out, .. } => out,
        }
    }
}

enum DecodeState {
    Sniffing,
    Running(Inflater),
    Done,
}

struct DecodeStream {
    upstream: ByteStream,
    state: DecodeState,
}

impl Stream for DecodeStream {
    type Item = Result<Bytes, FetchError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if matches!(this.state, DecodeState::Done) {
                return Poll::Ready(None);
            }
            match Pin::new(&mut this.upstream).poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Some(Err(e))) => {
                    this.state = DecodeState::Done;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(Some(Ok(chunk))) => {
                    if chunk.is_empty() {
                        // No byte to sniff yet; pass the empty chunk on.
                        return Poll::Ready(Some(Ok(chunk)));
                    }
                    if matches!(this.state, DecodeState::Sniffing) {
                        this.state = DecodeState::Running(Inflater::for_deflate(chunk[0]));
                    }
                    let inflater = match &mut this.state {
                        DecodeState::Running(inflater) => inflater,
                        _ => return Poll::Ready(None),
                    };
                    match inflater.feed(&chunk) {
                        Ok(out) if out.is_empty() => continue,
                        Ok(out) => return Poll::Ready(Some(Ok(out))),
                        Err(e) => {
                            this.state = DecodeState::Done;
                            return Poll::Ready(Some(Err(e)));
                        }
                    }
                }
                Poll::Ready(None) => {
                    let state = std::mem::replace(&mut this.state, DecodeState::Done);
                    let remaining = match state {
                        DecodeState::Running(inflater) => inflater.finish(),
                        _ => Bytes::new(),
                    };
                    return if remaining.is_empty() {
                        Poll::Ready(None)
                    } else {
                        Poll::Ready(Some(Ok(remaining)))
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
    use flate2::Compression;

    const PLAIN: &[u8] = b"hello world, hello world, hello world";

    fn gzip_bytes(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn zlib_bytes(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn raw_deflate_bytes(data: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn one_byte_chunks(data: Vec<u8>) -> ByteStream {
        ByteStream::from_iter(data.into_iter().map(|b| vec![b]).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn gzip_round_trip() {
        let decoded = decode_stream("gzip", ByteStream::once(Bytes::from(gzip_bytes(PLAIN))))
            .collect()
            .await
            .unwrap();
        assert_eq!(&decoded[..], PLAIN);
    }

    #[tokio::test]
    async fn x_gzip_alias_and_case_insensitivity() {
        for name in ["x-gzip", "GZIP"] {
            let decoded = decode_stream(name, ByteStream::once(Bytes::from(gzip_bytes(PLAIN))))
                .collect()
                .await
                .unwrap();
            assert_eq!(&decoded[..], PLAIN);
        }
    }

    #[tokio::test]
    async fn gzip_survives_one_byte_chunking() {
        let decoded = decode_stream("gzip", one_byte_chunks(gzip_bytes(PLAIN)))
            .collect()
            .await
            .unwrap();
        assert_eq!(&decoded[..], PLAIN);
    }

    #[tokio::test]
    async fn deflate_autodetects_zlib_wrapper() {
        let encoded = zlib_bytes(PLAIN);
        assert_eq!(encoded[0] & 0x0f, 0x08);
        let decoded = decode_stream("deflate", one_byte_chunks(encoded)).collect().await.unwrap();
        assert_eq!(&decoded[..], PLAIN);
    }

    #[tokio::test]
    async fn deflate_autodetects_raw_stream() {
        let encoded = raw_deflate_bytes(PLAIN);
        assert_ne!(encoded[0] & 0x0f, 0x08);
        let decoded = decode_stream("deflate", one_byte_chunks(encoded)).collect().await.unwrap();
        assert_eq!(&decoded[..], PLAIN);
    }

    #[tokio::test]
    async fn deflate_sniff_passes_empty_chunks_through() {
        let encoded = zlib_bytes(PLAIN);
        let chunks: Vec<Vec<u8>> = vec![Vec::new(), encoded];
        let decoded = decode_stream("deflate", ByteStream::from_iter(chunks)).collect().await.unwrap();
        assert_eq!(&decoded[..], PLAIN);
    }

    #[tokio::test]
    async fn truncated_gzip_still_yields_content() {
        let mut encoded = gzip_bytes(PLAIN);
        encoded.truncate(encoded.len() - 8);
        let decoded = decode_stream("gzip", ByteStream::once(Bytes::from(encoded)))
            .collect()
            .await
            .unwrap();
        assert_eq!(&decoded[..], PLAIN);
    }

    #[tokio::test]
    async fn malformed_gzip_surfaces_decode_error() {
        let result = decode_stream("gzip", ByteStream::once(Bytes::from_static(b"definitely not gzip")))
            .collect()
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.class, crate::domain::ErrorClass::Decode);
    }

    #[tokio::test]
    async fn brotli_round_trip() {
        let mut encoded = Vec::new();
        {
            let mut writer = brotli::CompressorWriter::new(&mut encoded, 4096, 5, 22);
            writer.write_all(PLAIN).unwrap();
        }
        let decoded = decode_stream("br", one_byte_chunks(encoded)).collect().await.unwrap();
        assert_eq!(&decoded[..], PLAIN);
    }

    #[tokio::test]
    async fn unknown_encoding_is_identity() {
        let decoded = decode_stream("snappy", ByteStream::once(Bytes::from_static(b"as-is")))
            .collect()
            .await
            .unwrap();
        assert_eq!(&decoded[..], b"as-is");
    }

    #[tokio::test]
    async fn empty_gzip_stream_decodes_to_nothing() {
        let decoded = decode_stream("gzip", ByteStream::empty()).collect().await.unwrap();
        assert!(decoded.is_empty());
    }

    #[tokio::test]
    async fn upstream_error_propagates() {
        let upstream = ByteStream::from_stream(futures_util::stream::iter(vec![Err(
            FetchError::transport("connection reset"),
        )]));
        let err = decode_stream("gzip", upstream).collect().await.unwrap_err();
        assert_eq!(err.message, "connection reset");
    }
}
