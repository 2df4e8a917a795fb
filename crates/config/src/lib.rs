use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable prefix, e.g. `CORPUSPREP_SIL_PADDING_FRAMES=50`.
pub const ENV_PREFIX: &str = "CORPUSPREP";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("settings file '{0}' does not exist")]
    MissingFile(PathBuf),
}

/// Preprocessing settings shared by the label and feature jobs.
///
/// Selector fields (`corpus`, `model`, `label_type`) are kept as raw strings
/// here and validated by the consumers before any work starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Corpus name: "switchboard", "csj" or "timit".
    pub corpus: Option<String>,
    /// Label style: "ctc" or "attention".
    pub model: String,
    /// Corpus-specific label type (e.g. "kana", "kanji", "phone39").
    pub label_type: Option<String>,
    /// Directory holding the persisted symbol tables.
    pub map_dir: PathBuf,
    /// Root directory for per-utterance artifacts.
    pub output_dir: PathBuf,
    /// Silence margin added around each utterance, in frames.
    pub sil_padding_frames: usize,
    /// Feature frames per second of audio (10ms hop = 100).
    pub frame_rate: u32,
    /// Upper bound on fixed-point rewrite passes per cleaning rule.
    pub max_rewrite_iterations: usize,
    /// CSJ only: separate stacked words with the separator symbol.
    pub divide_by_space: bool,
    /// CSJ only: `kana+phone phone ...` conversion table.
    pub kana_phone_path: Option<PathBuf>,
    /// TIMIT only: `phone61 phone48 phone39` collapse table.
    pub phone_map_path: Option<PathBuf>,
    /// Converter used when a WAV file cannot be decoded directly.
    pub sox_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            corpus: None,
            model: "ctc".to_string(),
            label_type: None,
            map_dir: PathBuf::from("mapping_files"),
            output_dir: PathBuf::from("dataset"),
            sil_padding_frames: 0,
            frame_rate: 100,
            max_rewrite_iterations: 1000,
            divide_by_space: false,
            kana_phone_path: None,
            phone_map_path: None,
            sox_path: "sox".to_string(),
        }
    }
}

impl Settings {
    /// Loads settings: defaults, then the optional TOML file, then `CORPUSPREP_*`
    /// environment variables (nested keys separated by `__`).
    pub fn load(file: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            if !path.exists() {
                return Err(SettingsError::MissingFile(path.to_path_buf()));
            }
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?.try_deserialize::<Settings>()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.model, "ctc");
        assert_eq!(settings.frame_rate, 100);
        assert_eq!(settings.sil_padding_frames, 0);
        assert_eq!(settings.max_rewrite_iterations, 1000);
        assert_eq!(settings.map_dir, PathBuf::from("mapping_files"));
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prep.toml");
        std::fs::write(
            &path,
            "corpus = \"csj\"\nmodel = \"attention\"\nsil_padding_frames = 50\ndivide_by_space = true\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.corpus.as_deref(), Some("csj"));
        assert_eq!(settings.model, "attention");
        assert_eq!(settings.sil_padding_frames, 50);
        assert!(settings.divide_by_space);
        // untouched keys keep their defaults
        assert_eq!(settings.frame_rate, 100);
        assert_eq!(settings.sox_path, "sox");
    }

    #[test]
    fn test_environment_overrides_defaults() {
        // no other test reads this key
        unsafe { std::env::set_var("CORPUSPREP_MAX_REWRITE_ITERATIONS", "77") };
        let settings = Settings::load(None);
        unsafe { std::env::remove_var("CORPUSPREP_MAX_REWRITE_ITERATIONS") };

        let settings = settings.unwrap();
        assert_eq!(settings.max_rewrite_iterations, 77);
        assert_eq!(settings.model, "ctc");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, SettingsError::MissingFile(_)));
    }
}
