//! Command implementations.

mod device;
mod info;
mod ports;
mod replicator;
mod run;
mod validate;

pub use device::run_device;
pub use info::run_info;
pub use ports::run_ports;
pub use replicator::run_replicator_check;
pub use run::run_pipeline;
pub use validate::run_validate;

use std::path::Path;

use contracts::MonitorBlueprint;
use tracing::info;

use crate::error::{CliError, Result};

/// Load and validate a config file
///
/// With `allow_missing`, a missing file yields the built-in defaults.
pub(crate) fn load_blueprint(path: &Path, allow_missing: bool) -> Result<MonitorBlueprint> {
    if !path.exists() {
        if allow_missing {
            info!(config = %path.display(), "Config file not found, using defaults");
            return Ok(MonitorBlueprint::default());
        }
        return Err(CliError::config_not_found(path.display().to_string()));
    }

    Ok(config_loader::ConfigLoader::load_from_path(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_config() {
        let path = Path::new("/nonexistent/dht-monitor.toml");
        assert!(matches!(
            load_blueprint(path, false),
            Err(CliError::ConfigNotFound { .. })
        ));
        assert!(load_blueprint(path, true).is_ok());
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[device]\nbaud_rate = 0").unwrap();

        let err = load_blueprint(file.path(), false).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
