use anyhow::{Context, Result};
use scriptstage_core::StageConfig;
use std::{env, path::PathBuf};
use tracing::info;

pub fn init_command(cwd: Option<PathBuf>, force: bool) -> Result<()> {
    let project_root = match cwd {
        Some(cwd) => cwd,
        None => env::current_dir().context("Failed to get current directory")?,
    };

    let config_path = project_root.join(".scriptstage.json");
    if config_path.exists() && !force {
        println!("❌ Config already exists at: {}", config_path.display());
        println!("   Use --force to overwrite");
        return Ok(());
    }

    StageConfig::default()
        .save_to_file(&config_path)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    info!("Wrote default configuration");

    println!("✅ Created config: {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_writes_default_config_once() {
        let dir = TempDir::new().unwrap();
        init_command(Some(dir.path().to_path_buf()), false).unwrap();

        let path = dir.path().join(".scriptstage.json");
        assert_eq!(StageConfig::load_from_file(&path).unwrap(), StageConfig::default());

        std::fs::write(&path, r#"{ "compile_cache_capacity": 8 }"#).unwrap();
        init_command(Some(dir.path().to_path_buf()), false).unwrap();
        assert_eq!(
            StageConfig::load_from_file(&path).unwrap().compile_cache_capacity,
            8
        );

        init_command(Some(dir.path().to_path_buf()), true).unwrap();
        assert_eq!(StageConfig::load_from_file(&path).unwrap(), StageConfig::default());
    }
}
