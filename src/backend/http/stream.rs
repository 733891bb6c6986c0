use futures::StreamExt;

use crate::backend::types::BackendError;

/// Incremental decoder for a `text/event-stream` body.
///
/// Bytes may split UTF-8 sequences and events arbitrarily; `push` returns the
/// `data:` payloads of every event completed so far.
#[derive(Debug, Default)]
pub struct SseDecoder {
    byte_buf: Vec<u8>,
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.byte_buf.extend_from_slice(bytes);
        self.decode_utf8();
        // Normalised on the whole buffer: a CRLF pair may straddle two chunks.
        if self.buffer.contains("\r\n") {
            self.buffer = self.buffer.replace("\r\n", "\n");
        }

        let mut payloads = Vec::new();
        while let Some(event_end) = self.buffer.find("\n\n") {
            let event_text: String = self.buffer.drain(..event_end + 2).collect();

            let data: Vec<&str> = event_text
                .lines()
                .filter_map(|line| {
                    line.strip_prefix("data: ")
                        .or_else(|| line.strip_prefix("data:"))
                })
                .collect();

            // Comment-only events (keepalives) carry no data lines.
            if !data.is_empty() {
                payloads.push(data.join("\n"));
            }
        }
        payloads
    }

    fn decode_utf8(&mut self) {
        loop {
            match std::str::from_utf8(&self.byte_buf) {
                Ok(s) => {
                    self.buffer.push_str(s);
                    self.byte_buf.clear();
                    return;
                }
                Err(e) => {
                    let valid_up_to = e.valid_up_to();
                    let decoded = String::from_utf8_lossy(&self.byte_buf[..valid_up_to]);
                    self.buffer.push_str(&decoded);
                    match e.error_len() {
                        // Truncated sequence: wait for the next chunk.
                        None => {
                            self.byte_buf.drain(..valid_up_to);
                            return;
                        }
                        Some(bad) => {
                            self.byte_buf.drain(..valid_up_to + bad);
                        }
                    }
                }
            }
        }
    }
}

/// Reads an SSE response to its end, handing every payload to `on_payload`.
pub async fn read_sse_payloads<F>(
    response: reqwest::Response,
    mut on_payload: F,
) -> Result<(), BackendError>
where
    F: FnMut(&str),
{
    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    while let Some(chunk_result) = stream.next().await {
        let bytes = chunk_result.map_err(|e| BackendError::Network(format!("Stream error: {}", e)))?;
        for payload in decoder.push(&bytes) {
            on_payload(&payload);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b"data: {\"a\":1}\n\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string()]);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"a\"").is_empty());
        assert!(decoder.push(b":1}\r\n").is_empty());
        let payloads = decoder.push(b"\r\ndata:second\n\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_crlf_terminator_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: one\r\n\r").is_empty());
        let payloads = decoder.push(b"\ndata: two\r\n\r\n");
        assert_eq!(payloads, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_multibyte_char_split() {
        let mut decoder = SseDecoder::new();
        let text = "data: héllo\n\n".as_bytes();
        // Split inside the two-byte 'é'.
        let split = text.iter().position(|b| *b == 0xC3).unwrap() + 1;
        assert!(decoder.push(&text[..split]).is_empty());
        let payloads = decoder.push(&text[split..]);
        assert_eq!(payloads, vec!["héllo".to_string()]);
    }

    #[test]
    fn test_keepalive_comments_skipped() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": ping\n\nevent: message\ndata: x\n\n");
        assert_eq!(payloads, vec!["x".to_string()]);
    }
}
