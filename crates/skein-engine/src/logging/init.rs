use std::sync::Once;

/// Logger configuration.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Filter in `env_logger` syntax (e.g. "skein_engine=debug,wgpu=warn").
    /// `None` defers to `RUST_LOG`, then to [`LoggingConfig::library_default`].
    pub filter: Option<String>,
    pub write_style: Option<env_logger::WriteStyle>,
}

impl LoggingConfig {
    /// Verbose enough to see what the engine is doing without drowning in
    /// the GPU stack's output.
    pub fn library_default() -> String {
        "warn,skein_engine=info".to_owned()
    }

    fn resolve_filter(&self) -> String {
        if let Some(filter) = &self.filter {
            filter.clone()
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            filter
        } else {
            Self::library_default()
        }
    }
}

static INIT: Once = Once::new();

/// Installs `env_logger` as the global logger. Idempotent; an embedder that
/// already installed its own logger keeps it.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let installed = env_logger::Builder::new()
            .parse_filters(&config.resolve_filter())
            .write_style(config.write_style.unwrap_or(env_logger::WriteStyle::Auto))
            .try_init();
        if installed.is_ok() {
            log::debug!("logging initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins() {
        let config = LoggingConfig {
            filter: Some("debug".to_owned()),
            write_style: None,
        };
        assert_eq!(config.resolve_filter(), "debug");
    }

    #[test]
    fn default_quiets_everything_but_the_engine() {
        assert!(LoggingConfig::library_default().starts_with("warn"));
        assert!(LoggingConfig::library_default().contains("skein_engine=info"));
    }
}
