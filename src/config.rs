use crate::analytics::MAX_WINDOW_COUNT;
use std::{env, path::PathBuf};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_WINDOW_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    /// Windows shown per chart and selectable in the view.
    pub window_count: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let data_dir = lookup("APP_DATA_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let window_count = lookup("WINDOW_COUNT")
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|count| *count > 0)
            .map(|count| count.min(MAX_WINDOW_COUNT))
            .unwrap_or(DEFAULT_WINDOW_COUNT);

        Self {
            port,
            data_dir,
            window_count,
        }
    }
}
