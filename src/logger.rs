use tracing::Level;

/// Logging setup for wal-kv
pub struct Logger;

impl Logger {
    /// Install the stderr subscriber at `level` ("error", "warn", "info", "debug", "trace").
    ///
    /// Unknown levels fall back to `warn`. Calling this more than once keeps the first
    /// subscriber.
    pub fn init(level: &str) {
        let level = Self::parse_level(level);
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    pub fn parse_level(level: &str) -> Level {
        level.parse().unwrap_or(Level::WARN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(Logger::parse_level("debug"), Level::DEBUG);
        assert_eq!(Logger::parse_level("INFO"), Level::INFO);
        assert_eq!(Logger::parse_level("nonsense"), Level::WARN);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        Logger::init("info");
        Logger::init("debug");
    }
}
