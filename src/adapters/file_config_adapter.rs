//! INI file configuration adapter.
//!
//! Backtest settings live under `[backtest]`, strategy selection under
//! `[strategy]`, data directory under `[data]` and optimizer settings under
//! `[optimize]`. Every getter falls back to a caller-supplied default when
//! the key is absent or unparseable.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    ini: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let mut ini = Ini::new();
        ini.load(path.as_ref()).map_err(std::io::Error::other)?;
        Ok(Self { ini })
    }

    pub fn from_string(content: &str) -> Result<Self, std::io::Error> {
        let mut ini = Ini::new();
        ini.read(content.to_string()).map_err(std::io::Error::other)?;
        Ok(Self { ini })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.ini
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.ini
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.ini
            .get(section, key)
            .and_then(|v| parse_bool(&v))
            .unwrap_or(default)
    }
}
