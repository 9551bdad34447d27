use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Options {
    /// Conflicts allowed per `solve()` before answering TIMEOUT.
    pub conflict_limit: Option<usize>,
    /// Wall-clock budget per `solve()` before answering TIMEOUT.
    pub time_limit: Option<Duration>,
}

pub const DEFAULT_OPTIONS: Options = Options {
    conflict_limit: None,
    time_limit: None,
};

impl Default for Options {
    fn default() -> Self {
        DEFAULT_OPTIONS
    }
}
