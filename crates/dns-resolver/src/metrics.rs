/// Metrics from handling a single request.  The resolver builds this
/// structure and leaves it to the caller to report it.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Metrics {
    /// Questions answered from the cache.
    pub cache_hits: u64,
    /// Questions with no unexpired answer in the cache.
    pub cache_misses: u64,
    /// Requests which the upstream nameserver answered.
    pub upstream_hits: u64,
    /// Requests which the upstream nameserver failed to answer, or
    /// answered with something unparseable.
    pub upstream_misses: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn cache_miss(&mut self) {
        self.cache_misses += 1;
    }

    pub fn upstream_hit(&mut self) {
        self.upstream_hits += 1;
    }

    pub fn upstream_miss(&mut self) {
        self.upstream_misses += 1;
    }
}
