//! Ambient state the extractor reads from.
//!
//! Browser bindings implement [`CaptureEnvironment`] over `window`; everything
//! else (server rendering, tests, native tools) uses [`EmptyEnvironment`] or a
//! fixed [`SnapshotEnvironment`].

use chrono::{DateTime, Utc};
use url::Url;

use crate::query::QueryParams;

/// Device context reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub language: String,
    pub timezone: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub user_agent: String,
}

pub trait CaptureEnvironment {
    /// Query parameters of the current location.
    fn query_params(&self) -> QueryParams;
    /// URL of the referring page, if the navigation had one.
    fn referrer(&self) -> Option<String>;
    /// Current path without query or fragment. `None` when there is no
    /// location at all.
    fn path(&self) -> Option<String>;
    /// `None` when the platform exposes no device context.
    fn device_info(&self) -> Option<DeviceInfo>;
    fn now(&self) -> DateTime<Utc>;
}

impl<T: CaptureEnvironment + ?Sized> CaptureEnvironment for &T {
    fn query_params(&self) -> QueryParams {
        (**self).query_params()
    }

    fn referrer(&self) -> Option<String> {
        (**self).referrer()
    }

    fn path(&self) -> Option<String> {
        (**self).path()
    }

    fn device_info(&self) -> Option<DeviceInfo> {
        (**self).device_info()
    }

    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Environment with no location, referrer, or device context.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyEnvironment;

impl CaptureEnvironment for EmptyEnvironment {
    fn query_params(&self) -> QueryParams {
        QueryParams::default()
    }

    fn referrer(&self) -> Option<String> {
        None
    }

    fn path(&self) -> Option<String> {
        None
    }

    fn device_info(&self) -> Option<DeviceInfo> {
        None
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Environment frozen from a landing URL, for native callers and tests.
#[derive(Debug, Clone)]
pub struct SnapshotEnvironment {
    query: QueryParams,
    path: String,
    referrer: Option<String>,
    device: Option<DeviceInfo>,
    clock: Option<DateTime<Utc>>,
}

impl SnapshotEnvironment {
    pub fn from_url(landing_url: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(landing_url)?;
        Ok(Self {
            query: QueryParams::from_url(&url),
            path: url.path().to_string(),
            referrer: None,
            device: None,
            clock: None,
        })
    }

    #[must_use]
    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    #[must_use]
    pub fn with_device(mut self, device: DeviceInfo) -> Self {
        self.device = Some(device);
        self
    }

    /// Pins `now()` to a fixed instant.
    #[must_use]
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }
}

impl CaptureEnvironment for SnapshotEnvironment {
    fn query_params(&self) -> QueryParams {
        self.query.clone()
    }

    fn referrer(&self) -> Option<String> {
        self.referrer.clone()
    }

    fn path(&self) -> Option<String> {
        Some(self.path.clone())
    }

    fn device_info(&self) -> Option<DeviceInfo> {
        self.device.clone()
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_drops_query_and_fragment_from_path() {
        let env = SnapshotEnvironment::from_url("https://shop.example.com/plans/pro?utm_source=x#faq")
            .expect("valid url");
        assert_eq!(env.path().as_deref(), Some("/plans/pro"));
        assert_eq!(env.query_params().get("utm_source"), Some("x"));
    }

    #[test]
    fn snapshot_rejects_relative_urls() {
        assert!(SnapshotEnvironment::from_url("/pricing?utm_source=x").is_err());
    }

    #[test]
    fn empty_environment_reports_nothing() {
        let env = EmptyEnvironment;
        assert!(env.query_params().is_empty());
        assert_eq!(env.referrer(), None);
        assert_eq!(env.path(), None);
        assert_eq!(env.device_info(), None);
    }
}
