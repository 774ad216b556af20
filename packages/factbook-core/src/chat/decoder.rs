//! Incremental UTF-8 decoding for streamed chat responses.
//!
//! The backend streams the answer as raw UTF-8 text with transport-determined
//! chunk boundaries, so a multi-byte character can be split across two reads.
//! One decoder instance lives for the whole read loop and carries the
//! incomplete tail bytes from one chunk to the next.

use futures::{Stream, StreamExt};
use std::pin::pin;

use crate::Result;

/// Stateful incremental UTF-8 decoder.
///
/// Invalid sequences are replaced with U+FFFD rather than rejected, matching
/// a non-fatal text decoder; incomplete sequences at a chunk boundary are
/// held back until the next [`push`](StreamDecoder::push).
#[derive(Debug, Default)]
pub struct StreamDecoder {
    carry: Vec<u8>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk of bytes, returning every complete character.
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.carry.extend_from_slice(bytes);
        let buf = std::mem::take(&mut self.carry);

        let mut out = String::with_capacity(buf.len());
        let mut rest: &[u8] = &buf;

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    return out;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        out.push_str(text);
                    }
                    match err.error_len() {
                        // Invalid sequence in the middle: replace and resume.
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        // Incomplete sequence at the end: keep for next push.
                        None => {
                            self.carry = after.to_vec();
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Flush the decoder at end of stream.
    ///
    /// A dangling partial sequence (the stream ended mid-character) becomes a
    /// single U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.carry.is_empty() {
            String::new()
        } else {
            self.carry.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}

/// Adapt a fallible byte-chunk stream into a fallible text-chunk stream.
///
/// Chunks are decoded in arrival order with a single [`StreamDecoder`], so
/// characters split across chunk boundaries reassemble correctly. A transport
/// error ends the stream after being yielded.
pub fn decode_stream<S, B>(bytes: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = Result<B>>,
    B: AsRef<[u8]>,
{
    async_stream::stream! {
        let mut decoder = StreamDecoder::new();
        let mut bytes = pin!(bytes);
        let mut failed = false;

        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    let text = decoder.push(chunk.as_ref());
                    if !text.is_empty() {
                        yield Ok(text);
                    }
                }
                Err(err) => {
                    yield Err(err);
                    failed = true;
                    break;
                }
            }
        }

        if !failed {
            let tail = decoder.finish();
            if !tail.is_empty() {
                yield Ok(tail);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use futures::stream;

    #[test]
    fn decodes_ascii_chunks() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.push(b"Hel"), "Hel");
        assert_eq!(decoder.push(b"lo"), "lo");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn reassembles_split_multibyte_character() {
        // U+C804 is 0xEC 0xA0 0x84 in UTF-8
        let bytes = "전략".as_bytes();
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.push(&bytes[..2]), "");
        assert_eq!(decoder.push(&bytes[2..4]), "전");
        assert_eq!(decoder.push(&bytes[4..]), "략");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn replaces_invalid_bytes() {
        let mut decoder = StreamDecoder::new();
        let out = decoder.push(b"ok\xFF\xFEok");
        assert_eq!(out, "ok\u{FFFD}\u{FFFD}ok");
    }

    #[test]
    fn finish_replaces_dangling_partial_sequence() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.push(&[0xEC, 0xA0]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        // Decoder is reusable afterwards.
        assert_eq!(decoder.push(b"next"), "next");
    }

    #[tokio::test]
    async fn stream_decodes_in_arrival_order() {
        let chunks: Vec<Result<&[u8]>> = vec![Ok(b"Hel"), Ok(b"lo, "), Ok(b"world")];
        let decoded: Vec<String> = decode_stream(stream::iter(chunks))
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;
        assert_eq!(decoded.concat(), "Hello, world");
    }

    #[tokio::test]
    async fn stream_carries_partial_character_across_chunks() {
        let bytes = "마케팅 전략".as_bytes();
        // Split in the middle of the second character.
        let chunks: Vec<Result<&[u8]>> = vec![Ok(&bytes[..4]), Ok(&bytes[4..])];
        let decoded: Vec<String> = decode_stream(stream::iter(chunks))
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;
        assert_eq!(decoded.concat(), "마케팅 전략");
        assert!(!decoded.concat().contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn stream_ends_after_transport_error() {
        let chunks: Vec<Result<&[u8]>> = vec![
            Ok(b"part"),
            Err(Error::Api {
                status: 502,
                message: "bad gateway".to_string(),
            }),
            Ok(b"never delivered"),
        ];
        let results: Vec<Result<String>> = decode_stream(stream::iter(chunks)).collect().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_deref().unwrap(), "part");
        assert!(results[1].is_err());
    }
}
