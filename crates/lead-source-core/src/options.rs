use serde::{Deserialize, Serialize};

pub const DEFAULT_STORAGE_KEY: &str = "lead_source";
pub const DEFAULT_MAX_VALUE_LENGTH: usize = 500;
const DEFAULT_CATEGORY_ENABLED: bool = true;
const DEFAULT_OVERWRITE: bool = false;

/// Capture configuration.
///
/// JSON member names are camelCase (`adClickIds`, `storageKey`, ...) so the
/// same document can be handed over from a page script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureOptions {
    pub utm: bool,
    pub ad_click_ids: bool,
    pub referrer: bool,
    pub device: bool,
    pub page: bool,
    pub timestamp: bool,
    /// Replace stored data on every capture (last touch) instead of only the
    /// first (first touch).
    pub overwrite: bool,
    pub storage_key: String,
    pub max_value_length: usize,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            utm: DEFAULT_CATEGORY_ENABLED,
            ad_click_ids: DEFAULT_CATEGORY_ENABLED,
            referrer: DEFAULT_CATEGORY_ENABLED,
            device: DEFAULT_CATEGORY_ENABLED,
            page: DEFAULT_CATEGORY_ENABLED,
            timestamp: DEFAULT_CATEGORY_ENABLED,
            overwrite: DEFAULT_OVERWRITE,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            max_value_length: DEFAULT_MAX_VALUE_LENGTH,
        }
    }
}

impl CaptureOptions {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw)
    }

    /// Parses options supplied by an embedding page, falling back to the
    /// defaults when the document is malformed.
    #[must_use]
    pub fn from_json_or_default(raw: &str) -> Self {
        match Self::from_json(raw) {
            Ok(options) => options,
            Err(error) => {
                tracing::warn!(%error, "invalid capture options, using defaults");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn with_storage_key(mut self, storage_key: impl Into<String>) -> Self {
        self.storage_key = storage_key.into();
        self
    }

    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Options with every capture category switched off.
    #[must_use]
    pub fn nothing() -> Self {
        Self {
            utm: false,
            ad_click_ids: false,
            referrer: false,
            device: false,
            page: false,
            timestamp: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything_except_overwrite() {
        let options = CaptureOptions::default();
        assert!(options.utm && options.ad_click_ids && options.referrer);
        assert!(options.device && options.page && options.timestamp);
        assert!(!options.overwrite);
        assert_eq!(options.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(options.max_value_length, 500);
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_members() {
        let options =
            CaptureOptions::from_json(r#"{"adClickIds":false,"overwrite":true,"storageKey":"ls2"}"#)
                .expect("valid options");
        assert!(!options.ad_click_ids);
        assert!(options.overwrite);
        assert_eq!(options.storage_key, "ls2");
        assert!(options.utm);
        assert_eq!(options.max_value_length, DEFAULT_MAX_VALUE_LENGTH);
    }

    #[test]
    fn blank_json_means_defaults() {
        assert_eq!(
            CaptureOptions::from_json("  ").expect("blank is default"),
            CaptureOptions::default()
        );
    }

    #[test]
    fn malformed_json_falls_back_to_defaults() {
        assert_eq!(
            CaptureOptions::from_json_or_default("{\"utm\": nope"),
            CaptureOptions::default()
        );
    }
}
