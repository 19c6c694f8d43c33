pub(crate) const STORAGE_EVENT_NAME: &str = "storage";
pub(crate) const INTL_TIME_ZONE_FIELD: &str = "timeZone";
pub(crate) const LOCAL_STORAGE_WRITE_REJECTED: &str = "localStorage.setItem rejected the value";
pub(crate) const LOCAL_STORAGE_READ_REJECTED: &str = "localStorage.getItem threw";
pub(crate) const LOCAL_STORAGE_REMOVE_REJECTED: &str = "localStorage.removeItem threw";
