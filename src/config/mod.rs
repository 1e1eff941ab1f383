mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding `paths.data_dir`
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    prepare_paths(&mut config, std::env::var(DATA_DIR_ENV).ok());

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./fileforged.toml",
        "~/.config/fileforged/config.toml",
        "/etc/fileforged/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    let mut config = Config::default();
    prepare_paths(&mut config, std::env::var(DATA_DIR_ENV).ok());
    Ok(config)
}

/// Apply the data directory override and expand `~` in configured paths.
fn prepare_paths(config: &mut Config, data_dir_override: Option<String>) {
    if let Some(dir) = data_dir_override.filter(|d| !d.trim().is_empty()) {
        config.paths.data_dir = PathBuf::from(dir);
    }

    let paths = &mut config.paths;
    paths.data_dir = expand_tilde(&paths.data_dir);
    for dir in [
        &mut paths.uploads_dir,
        &mut paths.outputs_dir,
        &mut paths.jobs_dir,
    ]
    .into_iter()
    .flatten()
    {
        *dir = expand_tilde(dir);
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    let storage = &config.storage;
    if !storage.output_multiplier.is_finite() || storage.output_multiplier < 1.0 {
        anyhow::bail!(
            "storage.output_multiplier must be at least 1.0 (got {})",
            storage.output_multiplier
        );
    }

    let quality = config.defaults.image_quality;
    if !(1..=100).contains(&quality) {
        anyhow::bail!("defaults.image_quality must be between 1 and 100 (got {})", quality);
    }

    if config.defaults.ocr_language.trim().is_empty() {
        anyhow::bail!("defaults.ocr_language cannot be empty");
    }

    // Validate configured tool paths exist
    for tool in fileforged_tools::Tool::ALL {
        if let Some(path) = config.tools.get(tool) {
            if !path.exists() {
                tracing::warn!("Configured {} path does not exist: {:?}", tool, path);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fileforged_common::VideoPreset;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.paths.data_dir, PathBuf::from("/data"));
        assert_eq!(config.paths.uploads(), PathBuf::from("/data/uploads"));
        assert_eq!(config.storage.safety_margin_mb, 512);
        assert_eq!(config.storage.output_multiplier, 2.0);
        assert_eq!(config.storage.max_archive_depth, 3);
        assert_eq!(config.defaults.image_quality, 85);
        assert_eq!(config.defaults.video_preset, VideoPreset::Medium);
        assert_eq!(config.defaults.ocr_language, "fra");
        assert!(config.tools.magick_path.is_none());
    }

    #[test]
    fn parses_every_section() {
        let file = write_config(
            r#"
[paths]
data_dir = "/srv/convert"
outputs_dir = "/mnt/results"

[storage]
safety_margin_mb = 1024
output_multiplier = 3.5
max_archive_depth = 1

[defaults]
image_quality = 60
video_preset = "fast"
ocr_language = "eng"

[tools]
magick_path = "/opt/im/magick"
"#,
        );

        let config = load_config(file.path()).unwrap();
        let layout = config.paths.layout();
        assert_eq!(layout.outputs, PathBuf::from("/mnt/results"));
        assert_eq!(layout.jobs, PathBuf::from("/srv/convert/jobs"));
        assert_eq!(config.storage.policy().safety_margin, 1024 * 1024 * 1024);
        assert_eq!(config.storage.policy().output_multiplier, 3.5);
        assert_eq!(config.defaults.convert_options().video_preset, VideoPreset::Fast);
        assert_eq!(
            config.tools.magick_path.as_deref(),
            Some(Path::new("/opt/im/magick"))
        );
    }

    #[test]
    fn rejects_invalid_values() {
        for content in [
            "[storage]\noutput_multiplier = 0.5\n",
            "[defaults]\nimage_quality = 0\n",
            "[defaults]\nimage_quality = 101\n",
            "[defaults]\nocr_language = \"  \"\n",
        ] {
            let file = write_config(content);
            assert!(load_config(file.path()).is_err(), "accepted: {content}");
        }
    }

    #[test]
    fn rejects_unknown_preset() {
        let file = write_config("[defaults]\nvideo_preset = \"glacial\"\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn data_dir_override_applies() {
        let mut config = Config::default();
        prepare_paths(&mut config, Some("/var/lib/fileforged".into()));
        assert_eq!(
            config.paths.outputs(),
            PathBuf::from("/var/lib/fileforged/outputs")
        );

        let mut config = Config::default();
        prepare_paths(&mut config, Some(String::new()));
        assert_eq!(config.paths.data_dir, PathBuf::from("/data"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/fileforged.toml")).is_err());
    }
}
