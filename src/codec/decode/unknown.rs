use std::ops::Range;

use bytes::Bytes;

use crate::codec::blob::Blob;

/// Records the byte ranges of unknown fields within one message body.
///
/// Adjacent ranges are coalesced, so a run of unknown fields becomes a
/// single zero-copy slice of the input.
#[derive(Debug, Default)]
pub(crate) struct UnknownFieldCollector {
    runs: Vec<Range<usize>>,
}

impl UnknownFieldCollector {
    pub(crate) fn new() -> Self {
        UnknownFieldCollector::default()
    }

    pub(crate) fn capture(&mut self, span: Range<usize>) {
        match self.runs.last_mut() {
            Some(last) if last.end == span.start => last.end = span.end,
            _ => self.runs.push(span),
        }
    }

    /// Slices the captured runs out of `data`, or `None` if nothing was captured.
    pub(crate) fn finish(self, data: &Bytes) -> Option<Blob> {
        if self.runs.is_empty() {
            return None;
        }
        let chunks = self.runs.into_iter().map(|run| data.slice(run)).collect();
        Some(Blob::from_chunks(chunks))
    }
}
