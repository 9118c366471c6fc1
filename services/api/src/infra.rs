use bar_verify::config::AppConfig;
use bar_verify::error::AppError;
use bar_verify::workflows::verification::{
    GeminiCleaner, InMemoryJobStore, JobRunner, SnapshotDirectory,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Applies a `--snapshot` flag over the configured snapshot path.
pub(crate) fn override_snapshot(config: &mut AppConfig, snapshot: Option<PathBuf>) {
    if let Some(path) = snapshot {
        config.directory.snapshot_path = Some(path);
    }
}

/// Job runner wired to the Gemini cleaner and the configured directory snapshot.
pub(crate) fn build_runner(config: &AppConfig) -> Result<JobRunner<InMemoryJobStore>, AppError> {
    let snapshot = config.directory.require_snapshot()?;
    let cleaner = GeminiCleaner::new(config.ai.clone())?;

    Ok(JobRunner::new(
        Arc::new(InMemoryJobStore::default()),
        Arc::new(SnapshotDirectory::from_path(snapshot)),
        Arc::new(cleaner),
        config.ai.timeout,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bar_verify::config::{
        AiConfig, AppEnvironment, ConfigError, DirectoryConfig, ServerConfig, TelemetryConfig,
    };

    fn config() -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
                ansi: false,
            },
            ai: AiConfig::default(),
            directory: DirectoryConfig::default(),
        }
    }

    #[test]
    fn runner_requires_a_snapshot() {
        let config = config();
        match build_runner(&config) {
            Err(AppError::Config(ConfigError::MissingSnapshot)) => {}
            Err(other) => panic!("expected missing snapshot, got {other}"),
            Ok(_) => panic!("expected missing snapshot"),
        }
    }

    #[test]
    fn snapshot_flag_overrides_configuration() {
        let mut config = config();
        config.directory.snapshot_path = Some(PathBuf::from("/etc/bar/configured.json"));
        override_snapshot(&mut config, None);
        assert_eq!(
            config.directory.snapshot_path,
            Some(PathBuf::from("/etc/bar/configured.json"))
        );

        override_snapshot(&mut config, Some(PathBuf::from("flag.json")));
        assert_eq!(config.directory.snapshot_path, Some(PathBuf::from("flag.json")));
        assert!(build_runner(&config).is_ok());
    }
}
