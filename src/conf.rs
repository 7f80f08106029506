use crate::{Error, Result};
use std::{env, str::FromStr, time::Duration};
use url::Url;

/// Number of most recent dated entries kept by the dashboard series.
pub const SERIES_WINDOW: usize = 7;

/// Map center used when there is nothing to show, as (lat, lon).
pub const FALLBACK_CENTER: (f64, f64) = (31.337319, 73.057297);

pub const DEFAULT_ZOOM: u8 = 12;

pub const SLOW_REQUEST_SECS: f64 = 5.0;

const ENV_BACKEND_URL: &str = "ROUTESYNC_BACKEND_URL";
const ENV_BIND: &str = "ROUTESYNC_BIND";
const ENV_PORT: &str = "ROUTESYNC_PORT";
const ENV_REQUEST_TIMEOUT_SECS: &str = "ROUTESYNC_REQUEST_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct Conf {
    pub backend_url: Url,
    pub bind: String,
    pub port: u16,
    pub request_timeout: Duration,
}

impl Conf {
    pub fn from_env() -> Result<Conf> {
        Conf::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Conf> {
        let backend_url = lookup(ENV_BACKEND_URL).unwrap_or("http://127.0.0.1:3001".into());
        let backend_url = Url::parse(&backend_url).map_err(|e| {
            Error::InvalidInput(format!("{ENV_BACKEND_URL} is not a valid URL: {e}"))
        })?;
        if backend_url.cannot_be_a_base() {
            Err(Error::InvalidInput(format!(
                "{ENV_BACKEND_URL} must be an absolute http(s) URL"
            )))?
        }
        let timeout_secs: u64 = parse_or(&lookup, ENV_REQUEST_TIMEOUT_SECS, 30)?;
        if timeout_secs == 0 {
            Err(Error::InvalidInput(format!(
                "{ENV_REQUEST_TIMEOUT_SECS} must be greater than zero"
            )))?
        }
        Ok(Conf {
            backend_url,
            bind: lookup(ENV_BIND).unwrap_or("127.0.0.1".into()),
            port: parse_or(&lookup, ENV_PORT, 8000)?,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    #[cfg(test)]
    pub fn mock() -> Conf {
        Conf {
            backend_url: Url::parse("http://127.0.0.1:3001").unwrap(),
            bind: "127.0.0.1".into(),
            port: 8000,
            request_timeout: Duration::from_millis(200),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::InvalidInput(format!("{key} has invalid value: {value}"))),
        None => Ok(default),
    }
}
