// Reader configuration for wirelite parse entry points

/// Limits applied while parsing untrusted input.
///
/// Both limits are off by default: nesting depth is bounded only by the
/// input itself, and any input size is accepted. Callers parsing data from
/// outside their process should set both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReaderOptions {
    /// Maximum depth of nested messages below the top-level one.
    pub recursion_limit: Option<usize>,
    /// Maximum encoded size of a top-level or delimited message, in bytes.
    pub size_limit: Option<usize>,
}

impl ReaderOptions {
    pub fn new() -> Self {
        ReaderOptions::default()
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = Some(limit);
        self
    }

    pub fn with_size_limit(mut self, limit: usize) -> Self {
        self.size_limit = Some(limit);
        self
    }
}
