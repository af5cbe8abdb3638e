use crate::commands::Out;
use crate::{Config, Result};
use std::path::Path;

/// Creates a `config.json` file with default settings.
///
/// # Arguments
/// - `path` - Where to write the file. Defaults to `client-grid/config.json` in the platform
///   config directory.
/// - `seed` - A seed file to record in the config. It is stored as given, so a relative path is
///   later resolved against the directory of the config file.
///
/// # Errors
/// - Returns an error if a config file already exists at the path or it cannot be written.
pub async fn init(path: Option<&Path>, seed: Option<&Path>) -> Result<Out<()>> {
    let config = Config::create(path, seed).await?;
    let written = config
        .config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    Ok(format!("Successfully created the config file {written}").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorType;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_writes_loadable_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let out = init(Some(&path), Some(Path::new("clients.csv")))
            .await
            .unwrap();
        assert!(out.message().contains("config.json"));

        let config = Config::load(Some(&path)).await.unwrap();
        assert_eq!(config.seed(), Some(dir.path().join("clients.csv")));

        let err = init(Some(&path), None).await.unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Config);
    }
}
