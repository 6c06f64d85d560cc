use thiserror::Error;

use crate::probe::ProbeError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("cannot resolve notification user {0:?}")]
    NotifyUser(String),
    #[error("probe failed: {0}")]
    Probe(#[from] ProbeError),
}
