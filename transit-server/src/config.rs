//! Server configuration from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;
use tracing::warn;

use crate::cache::CacheConfig;
use crate::feed::{DEFAULT_FEED_URL, FeedClientConfig, FeedSource};
use crate::vehicles::{DEFAULT_VEHICLES_URL, VehicleClientConfig};

/// Configuration for the whole server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Where the static feed comes from.
    pub feed_source: FeedSource,

    /// Feed download timeout in seconds.
    pub feed_timeout_secs: u64,

    /// Wall-clock times in `refresh_tz` at which the feed is reloaded.
    pub refresh_times: Vec<NaiveTime>,

    /// Zone the refresh times are read in.
    pub refresh_tz: Tz,

    /// Live vehicle position endpoint.
    pub vehicles_url: String,

    /// How often vehicle positions are polled.
    pub vehicles_poll: Duration,

    /// Vehicle request timeout in seconds.
    pub vehicles_timeout_secs: u64,

    /// Listen address.
    pub addr: SocketAddr,

    /// Resolution cache sizing.
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// Unset variables take their default; unparseable ones are logged and
    /// also take their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let feed_source = match (lookup("GTFS_FILE"), lookup("GTFS_URL")) {
            (Some(path), _) if !path.is_empty() => FeedSource::File(PathBuf::from(path)),
            (_, Some(url)) if !url.is_empty() => FeedSource::Http(url),
            _ => defaults.feed_source,
        };

        let refresh_times = match lookup("REFRESH_TIMES") {
            Some(raw) => parse_times(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "invalid REFRESH_TIMES, using default");
                defaults.refresh_times.clone()
            }),
            None => defaults.refresh_times,
        };

        let host = parsed(&lookup, "HOST", defaults.addr.ip());
        let port = parsed(&lookup, "PORT", defaults.addr.port());

        Self {
            feed_source,
            feed_timeout_secs: parsed(&lookup, "GTFS_TIMEOUT_SECS", defaults.feed_timeout_secs),
            refresh_times,
            refresh_tz: parsed(&lookup, "REFRESH_TZ", defaults.refresh_tz),
            vehicles_url: lookup("VEHICLES_URL")
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.vehicles_url),
            vehicles_poll: Duration::from_secs(parsed(
                &lookup,
                "VEHICLES_POLL_SECS",
                defaults.vehicles_poll.as_secs(),
            )),
            vehicles_timeout_secs: parsed(
                &lookup,
                "VEHICLES_TIMEOUT_SECS",
                defaults.vehicles_timeout_secs,
            ),
            addr: SocketAddr::new(host, port),
            cache: CacheConfig {
                max_capacity: lookup("CACHE_MAX_CAPACITY").and_then(|raw| {
                    raw.trim()
                        .parse()
                        .inspect_err(|_| {
                            warn!(value = %raw, "invalid CACHE_MAX_CAPACITY, leaving cache unbounded")
                        })
                        .ok()
                }),
            },
        }
    }

    pub fn feed_client(&self) -> FeedClientConfig {
        FeedClientConfig::new(self.feed_source.clone()).with_timeout(self.feed_timeout_secs)
    }

    pub fn vehicle_client(&self) -> VehicleClientConfig {
        VehicleClientConfig::new(self.vehicles_url.clone()).with_timeout(self.vehicles_timeout_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed_source: FeedSource::Http(DEFAULT_FEED_URL.to_string()),
            feed_timeout_secs: 60,
            refresh_times: vec![hm(8, 0), hm(16, 0)],
            refresh_tz: chrono_tz::Europe::Warsaw,
            vehicles_url: DEFAULT_VEHICLES_URL.to_string(),
            vehicles_poll: Duration::from_secs(10),
            vehicles_timeout_secs: 10,
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3000),
            cache: CacheConfig::default(),
        }
    }
}

fn hm(hour: u32, min: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, min, 0).unwrap_or(NaiveTime::MIN)
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        warn!(key, value = %raw, %default, "invalid value, using default");
        default
    })
}

/// Parse a comma-separated list of `HH:MM` times.
///
/// Returns `None` if any entry is malformed or the list is empty.
pub fn parse_times(raw: &str) -> Option<Vec<NaiveTime>> {
    let mut times = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| NaiveTime::parse_from_str(s, "%H:%M").ok())
        .collect::<Option<Vec<_>>>()?;
    if times.is_empty() {
        return None;
    }
    times.sort_unstable();
    times.dedup();
    Some(times)
}
