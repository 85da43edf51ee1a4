use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "kairos_engine::physics=trace,winit=warn").
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: log::LevelFilter,
    pub write_style: env_logger::WriteStyle,
    /// Append the module path to each record. The default format already
    /// prints the record target, which is usually the module.
    pub show_module: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
            write_style: env_logger::WriteStyle::Auto,
            show_module: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    pub fn with_level(mut self, level: log::LevelFilter) -> Self {
        self.default_level = level;
        self
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Idempotent; later calls are ignored. Filter precedence is the explicit
/// `env_filter`, then `RUST_LOG`, then `default_level`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(config.default_level);
        }

        builder.write_style(config.write_style);
        builder.format_module_path(config.show_module);

        // `try_init` so a test harness that already installed a logger is not fatal.
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_does_not_repeat_module_path() {
        let config = LoggingConfig::default();
        assert!(!config.show_module);
        assert_eq!(config.default_level, log::LevelFilter::Info);
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn builders_override_filter_and_level() {
        let config = LoggingConfig::default()
            .with_filter("kairos_engine::physics=trace")
            .with_level(log::LevelFilter::Warn);
        assert_eq!(config.env_filter.as_deref(), Some("kairos_engine::physics=trace"));
        assert_eq!(config.default_level, log::LevelFilter::Warn);
    }
}
