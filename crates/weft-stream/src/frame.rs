use std::collections::VecDeque;

/// One SSE frame: an optional event name plus the joined data payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental SSE frame splitter.
///
/// Bytes go in as they arrive from the transport; complete frames come out.
/// A frame is terminated by a blank line; `data:` lines accumulate and are
/// joined with `\n`; comment lines (leading `:`) and fields this client does
/// not use (`id:`, `retry:`) are skipped. Handles both LF and CRLF framing.
pub struct FrameBuffer {
    buffer: VecDeque<u8>,
    event: Option<String>,
    data_lines: Vec<String>,
}

impl FrameBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            event: None,
            data_lines: Vec::new(),
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract the next complete frame, if one is buffered
    pub fn next_frame(&mut self) -> Option<SseFrame> {
        while let Some(line) = self.next_line() {
            if line.is_empty() {
                // Blank line terminates the frame; dispatch if it carried data
                if !self.data_lines.is_empty() {
                    return Some(self.take_frame());
                }
                self.event = None;
                continue;
            }
            self.accept_line(&line);
        }
        None
    }

    /// Flush a trailing frame that was never terminated by a blank line
    /// (stream ended mid-frame)
    pub fn flush(&mut self) -> Option<SseFrame> {
        // Whatever is left in the byte buffer is an unterminated line
        if !self.buffer.is_empty() {
            let rest: Vec<u8> = self.buffer.drain(..).collect();
            if let Ok(line) = std::str::from_utf8(&rest) {
                let line = line.trim_end_matches(['\r', '\n']);
                if !line.is_empty() {
                    self.accept_line(line);
                }
            }
        }
        if self.data_lines.is_empty() {
            None
        } else {
            Some(self.take_frame())
        }
    }

    fn accept_line(&mut self, line: &str) {
        if line.starts_with(':') {
            return; // comment/keep-alive
        }
        if let Some(value) = field_value(line, "event") {
            self.event = Some(value.to_string());
        } else if let Some(value) = field_value(line, "data") {
            self.data_lines.push(value.to_string());
        }
        // id:/retry: and unknown fields are ignored
    }

    fn take_frame(&mut self) -> SseFrame {
        SseFrame {
            event: self.event.take(),
            data: std::mem::take(&mut self.data_lines).join("\n"),
        }
    }

    fn next_line(&mut self) -> Option<String> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();

        match std::str::from_utf8(&line_bytes) {
            Ok(line) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
            Err(e) => {
                tracing::warn!("Dropping non-UTF-8 SSE line: {}", e);
                Some(String::new())
            }
        }
    }
}

/// `field_value("data: x", "data")` -> Some("x"); the SSE field format
/// allows a single space after the colon, which is stripped
fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(field)?;
    let value = rest.strip_prefix(':')?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame() {
        let mut buf = FrameBuffer::with_capacity(64);
        buf.extend(b"event: message_chunk\ndata: {\"id\":\"m1\"}\n\n");

        let frame = buf.next_frame().unwrap();
        assert_eq!(frame.event.as_deref(), Some("message_chunk"));
        assert_eq!(frame.data, "{\"id\":\"m1\"}");
        assert!(buf.next_frame().is_none());
    }

    #[test]
    fn test_partial_frame_across_chunks() {
        let mut buf = FrameBuffer::with_capacity(64);
        buf.extend(b"event: naviga");
        assert!(buf.next_frame().is_none());

        buf.extend(b"tion\ndata: {}\n\n");
        let frame = buf.next_frame().unwrap();
        assert_eq!(frame.event.as_deref(), Some("navigation"));
    }

    #[test]
    fn test_multiline_data_joined() {
        let mut buf = FrameBuffer::with_capacity(64);
        buf.extend(b"data: line one\ndata: line two\n\n");

        let frame = buf.next_frame().unwrap();
        assert_eq!(frame.data, "line one\nline two");
        assert_eq!(frame.event, None);
    }

    #[test]
    fn test_crlf_framing() {
        let mut buf = FrameBuffer::with_capacity(64);
        buf.extend(b"event: complete\r\ndata: {}\r\n\r\n");

        let frame = buf.next_frame().unwrap();
        assert_eq!(frame.event.as_deref(), Some("complete"));
        assert_eq!(frame.data, "{}");
    }

    #[test]
    fn test_comments_and_ids_ignored() {
        let mut buf = FrameBuffer::with_capacity(64);
        buf.extend(b": keep-alive\nid: 42\nretry: 3000\ndata: x\n\n");

        let frame = buf.next_frame().unwrap();
        assert_eq!(frame.data, "x");
    }

    #[test]
    fn test_blank_lines_without_data_skipped() {
        let mut buf = FrameBuffer::with_capacity(64);
        buf.extend(b"\n\nevent: progress\ndata: {}\n\n");

        let frame = buf.next_frame().unwrap();
        assert_eq!(frame.event.as_deref(), Some("progress"));
    }

    #[test]
    fn test_flush_unterminated_frame() {
        let mut buf = FrameBuffer::with_capacity(64);
        buf.extend(b"event: complete\ndata: {\"final_status\":\"ok\"}");
        assert!(buf.next_frame().is_none());

        let frame = buf.flush().unwrap();
        assert_eq!(frame.event.as_deref(), Some("complete"));
        assert_eq!(frame.data, "{\"final_status\":\"ok\"}");
    }

    #[test]
    fn test_two_frames_one_chunk() {
        let mut buf = FrameBuffer::with_capacity(64);
        buf.extend(b"event: a\ndata: 1\n\nevent: b\ndata: 2\n\n");

        assert_eq!(buf.next_frame().unwrap().event.as_deref(), Some("a"));
        assert_eq!(buf.next_frame().unwrap().event.as_deref(), Some("b"));
        assert!(buf.next_frame().is_none());
    }
}
