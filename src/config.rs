use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TOOL_PATH: &str = "exiftool";
pub const DEFAULT_OUTPUT_DIR: &str = "./output";
pub const DEFAULT_WORKERS: usize = 12;
pub const DEFAULT_EXTENSIONS: [&str; 5] = ["jpg", "raf", "nef", "arw", "cr3"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Metadata tool executable, invoked as `<tool_path> -j <file>`.
    pub tool_path: String,
    pub root_paths: Vec<String>,
    pub output_dir: String,
    /// Number of concurrent extractions.
    pub workers: usize,
    pub extensions: Vec<String>,
    pub ignore_patterns: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tool_path: DEFAULT_TOOL_PATH.to_string(),
            root_paths: vec![".".to_string()],
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            workers: DEFAULT_WORKERS,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            ignore_patterns: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Message(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.root_paths.is_empty() {
            return Err(ConfigError::Message(
                "at least one root path is required".to_string(),
            ));
        }
        if self.tool_path.trim().is_empty() {
            return Err(ConfigError::Message("tool_path is empty".to_string()));
        }
        Ok(())
    }
}

/// Load `Config.toml` (or the given file), then `PHOTO_STATS_*` environment variables.
pub fn load_configuration(config_file: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let defaults = AppConfig::default();

    let file_source = match config_file {
        Some(path) => ConfigFile::from(path).required(true),
        None => ConfigFile::with_name("Config").required(false),
    };

    let builder = Config::builder()
        .set_default("tool_path", defaults.tool_path)?
        .set_default("root_paths", defaults.root_paths)?
        .set_default("output_dir", defaults.output_dir)?
        .set_default("workers", defaults.workers as i64)?
        .set_default("extensions", defaults.extensions)?
        .set_default("ignore_patterns", Vec::<String>::new())?
        .add_source(file_source)
        .add_source(
            Environment::with_prefix("PHOTO_STATS")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("root_paths")
                .with_list_parse_key("extensions")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;

    let config = builder.try_deserialize::<AppConfig>()?;
    config.validate()?;
    Ok(config)
}

/// Remove directories that are subdirectories of other directories in the list.
pub fn non_overlapping_directories(dirs: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for dir in dirs {
        let dir_path = Path::new(&dir);

        if result
            .iter()
            .any(|kept| dir_path.starts_with(Path::new(kept)))
        {
            continue;
        }

        result.retain(|kept| !Path::new(kept).starts_with(dir_path));
        result.push(dir);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_overlapping_no_overlap() {
        let dirs = vec![
            "/home/user/photos".to_string(),
            "/home/user/docs".to_string(),
            "/var/data".to_string(),
        ];
        let result = non_overlapping_directories(dirs);
        assert_eq!(result.len(), 3);
        assert!(result.contains(&"/home/user/photos".to_string()));
        assert!(result.contains(&"/home/user/docs".to_string()));
        assert!(result.contains(&"/var/data".to_string()));
    }

    #[test]
    fn test_non_overlapping_with_subdirectory() {
        let dirs = vec![
            "/home/user".to_string(),
            "/home/user/photos".to_string(),
            "/var/data".to_string(),
        ];
        let result = non_overlapping_directories(dirs);
        assert_eq!(result.len(), 2);
        assert!(result.contains(&"/home/user".to_string()));
        assert!(result.contains(&"/var/data".to_string()));
        assert!(!result.contains(&"/home/user/photos".to_string()));
    }

    #[test]
    fn test_non_overlapping_parent_after_children() {
        let dirs = vec![
            "/photos/2023".to_string(),
            "/photos/2024".to_string(),
            "/photos".to_string(),
        ];
        let result = non_overlapping_directories(dirs);
        assert_eq!(result, vec!["/photos".to_string()]);
    }

    #[test]
    fn test_non_overlapping_duplicate_entries() {
        let dirs = vec!["/photos".to_string(), "/photos".to_string()];
        assert_eq!(non_overlapping_directories(dirs).len(), 1);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.workers, 12);
        assert_eq!(config.tool_path, "exiftool");
        assert_eq!(config.extensions.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = AppConfig {
            workers: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_configuration_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo-stats.toml");
        std::fs::write(
            &path,
            "tool_path = \"/opt/exiftool/exiftool\"\nroot_paths = [\"/mnt/camera\"]\nworkers = 4\n",
        )
        .unwrap();

        let config = load_configuration(Some(&path)).unwrap();
        assert_eq!(config.tool_path, "/opt/exiftool/exiftool");
        assert_eq!(config.root_paths, vec!["/mnt/camera".to_string()]);
        assert_eq!(config.workers, 4);
        assert_eq!(config.output_dir, DEFAULT_OUTPUT_DIR);
        assert_eq!(config.extensions.len(), 5);
    }
}
