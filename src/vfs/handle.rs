//! Open instances of the virtual file.

/// Answers bounded reads against content fixed at open time.
pub trait FileReader: Send + Sync {
    /// Bytes in `[offset, offset + len)`, clamped to the content.
    ///
    /// Reading at or past the end yields an empty slice.
    fn read(&self, offset: u64, len: usize) -> &[u8];

    /// Total content length.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One open of the virtual file.
///
/// Owns the baget generated when it was opened. The content never changes
/// and is dropped with the handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralHandle {
    content: Box<[u8]>,
}

impl EphemeralHandle {
    pub fn new(content: impl Into<Box<[u8]>>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// The whole generated content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

impl FileReader for EphemeralHandle {
    fn read(&self, offset: u64, len: usize) -> &[u8] {
        let size = self.content.len();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(size);
        let end = start.saturating_add(len).min(size);
        &self.content[start..end]
    }

    fn len(&self) -> usize {
        self.content.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> EphemeralHandle {
        EphemeralHandle::new(b"HELLO\n@\nWORLD\n".to_vec())
    }

    #[test]
    fn test_read_within_bounds() {
        let h = handle();
        assert_eq!(h.read(0, 5), b"HELLO");
        assert_eq!(h.read(8, 5), b"WORLD");
    }

    #[test]
    fn test_read_clamps_at_end() {
        let h = handle();
        assert_eq!(h.read(8, 4096), b"WORLD\n");
        assert_eq!(h.read(0, usize::MAX), h.content());
    }

    #[test]
    fn test_read_past_end_is_empty() {
        let h = handle();
        assert!(h.read(h.len() as u64, 10).is_empty());
        assert!(h.read(u64::MAX, 10).is_empty());
        assert!(h.read(3, 0).is_empty());
    }

    #[test]
    fn test_reads_match_slice_for_all_offsets() {
        let h = handle();
        let buf = h.content().to_vec();
        for offset in 0..=buf.len() + 2 {
            for len in 0..=buf.len() + 2 {
                let start = offset.min(buf.len());
                let end = (offset + len).min(buf.len());
                assert_eq!(h.read(offset as u64, len), &buf[start..end]);
            }
        }
    }

    #[test]
    fn test_empty_handle() {
        let h = EphemeralHandle::new(Vec::new());
        assert!(h.is_empty());
        assert!(h.read(0, 10).is_empty());
    }
}
