//! Line Decoder Module
//!
//! Splits a chunked response body into complete lines and turns each line
//! into a [`Frame`]. Both plain newline-delimited JSON and SSE `data:` framing
//! are accepted.

use crate::error::{ClientError, Result};
use crate::models::StreamChunk;

/// SSE sentinel some backends send instead of closing the body
const DONE_SENTINEL: &str = "[DONE]";

/// SSE fields that carry no chunk payload
const IGNORED_SSE_FIELDS: [&str; 3] = ["event:", "id:", "retry:"];

// == Frame ==
/// Meaning of one complete line of the body.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A parsed chunk to hand to the caller
    Chunk(StreamChunk),
    /// Blank line, SSE comment or SSE field without payload
    Skip,
    /// The `[DONE]` sentinel: the stream ends gracefully here
    End,
}

// == Line Decoder ==
/// Buffers raw bytes across network reads and yields only complete lines.
///
/// Bytes are buffered rather than text so a multi-byte character split
/// between two reads is reassembled before decoding.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one network read and drains every line it completes.
    ///
    /// The returned lines exclude their terminating `\n`. A trailing partial
    /// line stays buffered until the next call or [`LineDecoder::finish`].
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let scan_from = self.buffer.len();
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        for (offset, byte) in self.buffer[scan_from..].iter().enumerate() {
            if *byte == b'\n' {
                let end = scan_from + offset;
                lines.push(self.buffer[start..end].to_vec());
                start = end + 1;
            }
        }
        self.buffer.drain(..start);
        lines
    }

    /// Takes whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(rest)
        }
    }

    /// Number of bytes waiting for a line terminator.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

// == Parse Line ==
/// Interprets one complete line.
///
/// Malformed JSON and invalid UTF-8 are errors: the caller must stop the
/// stream rather than skip the line.
pub fn parse_line(raw: &[u8]) -> Result<Frame> {
    let line = std::str::from_utf8(raw).map_err(|e| ClientError::Parse {
        line: String::from_utf8_lossy(raw).into_owned(),
        reason: e.to_string(),
    })?;
    let line = line.trim();

    if line.is_empty() || line.starts_with(':') {
        return Ok(Frame::Skip);
    }

    let payload = match line.strip_prefix("data:") {
        Some(data) => data.trim_start(),
        None if IGNORED_SSE_FIELDS.iter().any(|f| line.starts_with(f)) => return Ok(Frame::Skip),
        None => line,
    };

    if payload.is_empty() {
        return Ok(Frame::Skip);
    }
    if payload == DONE_SENTINEL {
        return Ok(Frame::End);
    }

    serde_json::from_str::<StreamChunk>(payload)
        .map(Frame::Chunk)
        .map_err(|e| ClientError::Parse {
            line: payload.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BODY: &str = concat!(
        r#"{"chunk":"He","done":false}"#,
        "\n",
        r#"{"chunk":"llo","done":false}"#,
        "\n",
        r#"{"chunk":"","done":true,"tools_used":["search"]}"#,
        "\n",
    );

    fn decode_all(reads: &[&[u8]]) -> Vec<Frame> {
        let mut decoder = LineDecoder::new();
        let mut frames = Vec::new();
        for read in reads {
            for line in decoder.push(read) {
                frames.push(parse_line(&line).unwrap());
            }
        }
        if let Some(rest) = decoder.finish() {
            frames.push(parse_line(&rest).unwrap());
        }
        frames
    }

    #[test]
    fn test_holds_partial_line_until_next_read() {
        let mut decoder = LineDecoder::new();

        assert!(decoder.push(br#"{"chunk":"He","done":fal"#).is_empty());
        assert!(decoder.pending() > 0);

        let lines = decoder.push(b"se}\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(
            parse_line(&lines[0]).unwrap(),
            Frame::Chunk(StreamChunk::text("He"))
        );
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_closing_brace_in_second_read() {
        let whole = decode_all(&[BODY.as_bytes()]);
        let split_at = BODY.find('}').unwrap();
        let split = decode_all(&[&BODY.as_bytes()[..split_at], &BODY.as_bytes()[split_at..]]);

        assert_eq!(whole.len(), 3);
        assert_eq!(split, whole);
    }

    #[test]
    fn test_multibyte_char_split_across_reads() {
        let body = "{\"chunk\":\"caf\u{e9}\",\"done\":false}\n".as_bytes();
        let split_at = body.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let frames = decode_all(&[&body[..split_at], &body[split_at..]]);

        assert_eq!(frames, vec![Frame::Chunk(StreamChunk::text("caf\u{e9}"))]);
    }

    #[test]
    fn test_final_line_without_newline() {
        let frames = decode_all(&[br#"{"chunk":"tail","done":true}"#]);
        assert_eq!(frames.len(), 1);
        assert!(matches!(&frames[0], Frame::Chunk(c) if c.done && c.chunk == "tail"));
    }

    #[test]
    fn test_finish_ignores_trailing_whitespace() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"\r\n  ");
        assert!(decoder.finish().is_none());
    }

    #[test]
    fn test_sse_framing() {
        assert_eq!(
            parse_line(br#"data: {"chunk":"x","done":false}"#).unwrap(),
            Frame::Chunk(StreamChunk::text("x"))
        );
        assert_eq!(
            parse_line(br#"data:{"chunk":"y","done":false}"#).unwrap(),
            Frame::Chunk(StreamChunk::text("y"))
        );
        assert_eq!(parse_line(b": keep-alive").unwrap(), Frame::Skip);
        assert_eq!(parse_line(b"event: message").unwrap(), Frame::Skip);
        assert_eq!(parse_line(b"id: 4").unwrap(), Frame::Skip);
        assert_eq!(parse_line(b"").unwrap(), Frame::Skip);
        assert_eq!(parse_line(b"\r").unwrap(), Frame::Skip);
        assert_eq!(parse_line(b"data: [DONE]").unwrap(), Frame::End);
    }

    #[test]
    fn test_malformed_line_is_error() {
        let err = parse_line(b"{not json").unwrap_err();
        assert!(matches!(err, ClientError::Parse { line, .. } if line == "{not json"));
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        assert!(matches!(
            parse_line(&[0xFF, 0xFE, b'{', b'}']),
            Err(ClientError::Parse { .. })
        ));
    }

    proptest! {
        // Wherever the read boundaries fall, the decoded frames are the same.
        #[test]
        fn prop_read_boundaries_do_not_matter(cuts in prop::collection::vec(0usize..BODY.len(), 0..8)) {
            let bytes = BODY.as_bytes();
            let mut cuts = cuts;
            cuts.sort_unstable();
            cuts.dedup();

            let mut reads: Vec<&[u8]> = Vec::new();
            let mut prev = 0;
            for cut in cuts {
                reads.push(&bytes[prev..cut]);
                prev = cut;
            }
            reads.push(&bytes[prev..]);

            prop_assert_eq!(decode_all(&reads), decode_all(&[bytes]));
        }
    }
}
