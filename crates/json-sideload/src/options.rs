//! Resolution options.

/// Settings for one resolution pass.
///
/// # Example
///
/// ```
/// use json_sideload::Options;
///
/// let options = Options::new().max_depth(Some(16));
/// assert_eq!(options.depth_limit(), Some(16));
/// assert_eq!(Options::default().depth_limit(), Some(Options::DEFAULT_MAX_DEPTH));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    max_depth: Option<usize>,
}

impl Options {
    /// Default limit on relation nesting below the root.
    pub const DEFAULT_MAX_DEPTH: usize = 128;

    pub fn new() -> Self {
        Self::default()
    }

    /// Limit relation nesting below the root. `None` removes the limit, which
    /// lets cyclic data recurse without bound.
    pub fn max_depth(mut self, limit: Option<usize>) -> Self {
        self.max_depth = limit;
        self
    }

    pub fn depth_limit(&self) -> Option<usize> {
        self.max_depth
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: Some(Self::DEFAULT_MAX_DEPTH),
        }
    }
}
