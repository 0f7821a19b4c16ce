// Readiness token matching over a chunked output stream

/// Detects a readiness token in stdout chunks.
///
/// A tail of the previous chunk is carried over, so a token split across
/// two reads still matches.
#[derive(Debug, Clone)]
pub struct ReadinessMatcher {
    token: Vec<u8>,
    carry: Vec<u8>,
}

impl ReadinessMatcher {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.as_bytes().to_vec(),
            carry: Vec::new(),
        }
    }

    /// Feed one chunk; returns true once the token has been seen
    pub fn feed(&mut self, chunk: &[u8]) -> bool {
        if self.token.is_empty() {
            return true;
        }

        let mut window = std::mem::take(&mut self.carry);
        window.extend_from_slice(chunk);

        if contains_subslice(&window, &self.token) {
            return true;
        }

        let keep = (self.token.len() - 1).min(window.len());
        self.carry = window.split_off(window.len() - keep);
        false
    }
}

/// Byte substring search
pub fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}
