//!  Wanderlust Booking Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Server settings, checked once at startup

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, ensure};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_MAX_CONCURRENCY: usize = 256;
pub const DEFAULT_CHECKOUT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;
/// Requests per client IP per window
pub const DEFAULT_RATE_LIMIT_REQUESTS: u32 = 100;
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub catalog_path: PathBuf,
    /// In-process checkout when unset
    pub checkout_url: Option<String>,
    /// Only origin allowed by CORS. Any origin when unset.
    pub frontend_url: Option<String>,
    pub max_concurrency: usize,
    pub checkout_timeout_secs: u64,
    pub session_idle_secs: u64,
    pub max_sessions: usize,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            catalog_path: PathBuf::from("data/catalog.json"),
            checkout_url: None,
            frontend_url: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            checkout_timeout_secs: DEFAULT_CHECKOUT_TIMEOUT_SECS,
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
            max_sessions: DEFAULT_MAX_SESSIONS,
            rate_limit_requests: DEFAULT_RATE_LIMIT_REQUESTS,
            rate_limit_window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty() && !rest.starts_with('/'))
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.catalog_path.is_file(),
            "Catalog file {} does not exist",
            self.catalog_path.display()
        );
        if let Some(url) = &self.checkout_url {
            ensure!(is_http_url(url), "Checkout URL must be http(s), got {url:?}");
        }
        if let Some(url) = &self.frontend_url {
            ensure!(is_http_url(url), "Frontend URL must be http(s), got {url:?}");
        }
        ensure!(self.max_concurrency > 0, "Max concurrency must be at least 1");
        ensure!(
            self.checkout_timeout_secs > 0,
            "Checkout timeout must be at least 1 second"
        );
        ensure!(self.session_idle_secs > 0, "Session idle timeout must be at least 1 second");
        ensure!(self.max_sessions > 0, "Max sessions must be at least 1");
        ensure!(self.rate_limit_requests > 0, "Rate limit must allow at least 1 request");
        ensure!(
            self.rate_limit_window_secs > 0,
            "Rate limit window must be at least 1 second"
        );
        Ok(())
    }

    /// Idle sessions are looked for this often
    pub fn session_sweep_period(&self) -> Duration {
        Duration::from_secs((self.session_idle_secs / 4).clamp(1, 60))
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .context("Invalid host:port")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_catalog() -> AppConfig {
        AppConfig {
            catalog_path: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/data/catalog.json")),
            ..AppConfig::default()
        }
    }

    #[test]
    fn shipped_catalog_validates() {
        assert!(with_catalog().validate().is_ok());
        assert_eq!(with_catalog().socket_addr().unwrap().port(), DEFAULT_PORT);
    }

    #[test]
    fn missing_catalog_is_rejected() {
        let config = AppConfig {
            catalog_path: PathBuf::from("/definitely/not/here.json"),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn urls_must_be_http() {
        let mut config = with_catalog();
        config.frontend_url = Some("localhost:5173".into());
        assert!(config.validate().is_err());
        config.frontend_url = Some("http://localhost:5173".into());
        config.checkout_url = Some("ftp://pay.example".into());
        assert!(config.validate().is_err());
        config.checkout_url = Some("https://pay.example/sessions".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_limits_are_rejected() {
        for config in [
            AppConfig { max_sessions: 0, ..with_catalog() },
            AppConfig { session_idle_secs: 0, ..with_catalog() },
            AppConfig { rate_limit_requests: 0, ..with_catalog() },
            AppConfig { rate_limit_window_secs: 0, ..with_catalog() },
        ] {
            assert!(config.validate().is_err(), "{config:?}");
        }
    }

    #[test]
    fn sweep_period_tracks_idle_timeout() {
        assert_eq!(with_catalog().session_sweep_period(), Duration::from_secs(60));
        let config = AppConfig { session_idle_secs: 2, ..with_catalog() };
        assert_eq!(config.session_sweep_period(), Duration::from_secs(1));
    }
}
