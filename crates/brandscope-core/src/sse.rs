//! Incremental server-sent-events framing.
//!
//! Used on both sides of the wire: the server reads the upstream model's
//! event stream with it, and clients read the server's protocol stream.

/// Frame delimiter: one blank line.
const DELIMITER: &[u8] = b"\n\n";

/// Accumulates raw body chunks and yields complete frames.
///
/// Buffering happens on bytes, and only complete frames are decoded, so a
/// multi-byte character split across two chunks is reassembled intact.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: Vec<u8>,
}

impl FrameBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns every frame it completed, in order.
    ///
    /// The trailing partial fragment stays buffered for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        if self.pending.contains(&b'\r') {
            self.pending.retain(|&b| b != b'\r');
        }

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = find(&self.pending[start..], DELIMITER) {
            let end = start + offset;
            frames.push(String::from_utf8_lossy(&self.pending[start..end]).into_owned());
            start = end + DELIMITER.len();
        }
        self.pending.drain(..start);
        frames
    }

    /// Returns whatever is left once the body ends, if it is non-blank.
    pub fn finish(&mut self) -> Option<String> {
        let rest = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Payloads of every `data:` line in one frame; other lines are ignored.
pub fn data_lines(frame: &str) -> impl Iterator<Item = &str> {
    frame.lines().filter_map(|line| {
        line.strip_prefix("data:")
            .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
    })
}
