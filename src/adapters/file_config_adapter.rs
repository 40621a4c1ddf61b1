//! `ConfigPort` over an INI file: the `[engine]`, `[scoring]`, `[macro]`,
//! `[backtest]` and `[storage]` sections that `Settings::from_config` reads.
//!
//! Section and key names are case-insensitive and values come back trimmed.
//! A numeric key that does not parse falls back to its default with a
//! warning; range checks happen later in `config_validation`.

use std::path::Path;

use configparser::ini::Ini;
use tracing::warn;

use crate::domain::error::EngineError;
use crate::ports::config_port::ConfigPort;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| EngineError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, EngineError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| EngineError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn numeric<T>(
        &self,
        section: &str,
        key: &str,
        parsed: Result<Option<T>, String>,
    ) -> Option<T> {
        match parsed {
            Ok(value) => value,
            Err(reason) => {
                warn!(section, key, %reason, "ignoring malformed number, using default");
                None
            }
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.numeric(section, key, self.config.getint(section, key)).unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.numeric(section, key, self.config.getfloat(section, key)).unwrap_or(default)
    }

    fn sections(&self) -> Vec<String> {
        let mut names = self.config.sections();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[engine]
symbols = VOO, QQQ, MSFT

[macro]
volatility_symbol = ^VIX

[storage]
data_dir = /var/lib/signalcast
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("engine", "symbols"),
            Some("VOO, QQQ, MSFT".to_string())
        );
        assert_eq!(
            adapter.get_string("macro", "volatility_symbol"),
            Some("^VIX".to_string())
        );
        assert_eq!(
            adapter.get_string("storage", "data_dir"),
            Some("/var/lib/signalcast".to_string())
        );
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[engine]\nsymbols = VOO\n").unwrap();
        assert_eq!(adapter.get_string("engine", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
    }

    #[test]
    fn get_int_returns_value() {
        let adapter =
            FileConfigAdapter::from_string("[engine]\nmax_concurrency = 8\n").unwrap();
        assert_eq!(adapter.get_int("engine", "max_concurrency", 0), 8);
    }

    #[test]
    fn get_int_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[engine]\n").unwrap();
        assert_eq!(adapter.get_int("engine", "missing", 42), 42);
    }

    #[test]
    fn get_int_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[engine]\nmax_concurrency = abc\n").unwrap();
        assert_eq!(adapter.get_int("engine", "max_concurrency", 42), 42);
    }

    #[test]
    fn get_double_reads_negative_values() {
        let adapter =
            FileConfigAdapter::from_string("[scoring]\nsell_threshold = -1.5\n").unwrap();
        assert_eq!(adapter.get_double("scoring", "sell_threshold", 0.0), -1.5);
    }

    #[test]
    fn get_double_returns_default_for_missing() {
        let adapter = FileConfigAdapter::from_string("[scoring]\n").unwrap();
        assert_eq!(adapter.get_double("scoring", "missing", 2.5), 2.5);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = lots\n").unwrap();
        assert_eq!(
            adapter.get_double("backtest", "initial_capital", 99.9),
            99.9
        );
    }

    #[test]
    fn sections_are_listed_lowercase() {
        let adapter =
            FileConfigAdapter::from_string("[Storage]\nbackend = json\n[ENGINE]\nsymbols = VOO\n")
                .unwrap();
        assert_eq!(adapter.sections(), vec!["engine", "storage"]);
        assert_eq!(
            adapter.get_string("storage", "BACKEND"),
            Some("json".to_string())
        );
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[storage]\nbackend = sqlite\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_string("storage", "backend"),
            Some("sqlite".to_string())
        );
    }

    #[test]
    fn missing_file_is_a_parse_error_naming_the_path() {
        let err = FileConfigAdapter::from_file("/nonexistent/path/config.ini").unwrap_err();
        match err {
            EngineError::ConfigParse { file, .. } => {
                assert_eq!(file, "/nonexistent/path/config.ini")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
