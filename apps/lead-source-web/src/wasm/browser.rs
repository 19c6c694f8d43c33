use super::*;

/// Reads capture inputs from `window`. Every accessor degrades to `None`
/// when the piece of browser state it needs is missing.
pub(super) struct BrowserEnvironment {
    window: Option<web_sys::Window>,
}

impl BrowserEnvironment {
    pub(super) fn current() -> Self {
        Self {
            window: web_sys::window(),
        }
    }

    fn resolved_time_zone() -> Option<String> {
        let format = js_sys::Intl::DateTimeFormat::new(&js_sys::Array::new(), &js_sys::Object::new());
        let options = format.resolved_options();
        let zone = js_sys::Reflect::get(&options, &JsValue::from_str(INTL_TIME_ZONE_FIELD)).ok()?;
        zone.as_string().filter(|zone| !zone.is_empty())
    }
}

impl CaptureEnvironment for BrowserEnvironment {
    fn query_params(&self) -> QueryParams {
        self.window
            .as_ref()
            .and_then(|window| window.location().search().ok())
            .map(|search| QueryParams::parse(&search))
            .unwrap_or_default()
    }

    fn referrer(&self) -> Option<String> {
        let referrer = self.window.as_ref()?.document()?.referrer();
        if referrer.is_empty() { None } else { Some(referrer) }
    }

    fn path(&self) -> Option<String> {
        self.window.as_ref()?.location().pathname().ok()
    }

    fn device_info(&self) -> Option<DeviceInfo> {
        let window = self.window.as_ref()?;
        let navigator = window.navigator();
        let screen = window.screen().ok()?;
        let screen_width = u32::try_from(screen.width().ok()?).ok()?;
        let screen_height = u32::try_from(screen.height().ok()?).ok()?;
        Some(DeviceInfo {
            language: navigator.language()?,
            timezone: Self::resolved_time_zone()?,
            screen_width,
            screen_height,
            user_agent: navigator.user_agent().ok()?,
        })
    }

    fn now(&self) -> DateTime<Utc> {
        let now = js_sys::Date::now();
        if !now.is_finite() || now.is_sign_negative() {
            return DateTime::<Utc>::default();
        }
        DateTime::from_timestamp_millis(now.floor() as i64).unwrap_or_default()
    }
}

/// `window.localStorage`, or nothing when the page has no storage access
/// (sandboxed iframes, disabled cookies).
pub(super) struct LocalStorageStore {
    storage: Option<web_sys::Storage>,
}

impl LocalStorageStore {
    pub(super) fn current() -> Self {
        let storage = web_sys::window().and_then(|window| window.local_storage().ok().flatten());
        Self { storage }
    }

    fn storage(&self) -> Result<&web_sys::Storage, StoreError> {
        self.storage.as_ref().ok_or(StoreError::Unavailable)
    }
}

impl LeadSourceStore for LocalStorageStore {
    fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?.get_item(key).map_err(|_| StoreError::Read {
            key: key.to_string(),
            reason: LOCAL_STORAGE_READ_REJECTED.to_string(),
        })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|_| StoreError::Write {
                key: key.to_string(),
                reason: LOCAL_STORAGE_WRITE_REJECTED.to_string(),
            })
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let Some(storage) = self.storage.as_ref() else {
            return Ok(());
        };
        storage.remove_item(key).map_err(|_| StoreError::Remove {
            key: key.to_string(),
            reason: LOCAL_STORAGE_REMOVE_REJECTED.to_string(),
        })
    }
}
