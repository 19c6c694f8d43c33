//! Marketing attribution capture.
//!
//! On mount, [`LeadSource::capture`] reads campaign parameters, ad click ids,
//! referrer, landing path, device context and a timestamp from a
//! [`CaptureEnvironment`], and stores them as one JSON record in a
//! [`LeadSourceStore`]. With `overwrite` off the first record for a key is
//! kept (first touch); with it on every capture replaces it (last touch).
//! Reads go through [`LeadSource::get`] or the cached, notification-driven
//! [`LeadSource::snapshot`] / [`LeadSource::watch`].
//!
//! Nothing here returns an error to the caller: storage problems degrade to
//! "nothing captured" or "no data" and are logged with `tracing`.

pub mod environment;
pub mod error;
pub mod extract;
mod lead_source;
mod mount;
pub mod notifier;
pub mod options;
pub mod query;
pub mod record;
pub mod sanitize;
pub mod store;

pub use environment::{CaptureEnvironment, DeviceInfo, EmptyEnvironment, SnapshotEnvironment};
pub use error::LeadSourceError;
pub use extract::extract_lead_source;
pub use lead_source::{CaptureOutcome, LeadSource, LeadSourceWatch};
pub use mount::CaptureOnMount;
pub use notifier::{LeadSourceNotifier, Subscription};
pub use options::{CaptureOptions, DEFAULT_MAX_VALUE_LENGTH, DEFAULT_STORAGE_KEY};
pub use query::QueryParams;
pub use record::{AdNetwork, LeadSourceRecord, UtmParam};
pub use store::{LeadSourceStore, MemoryStore, StoreError, UnavailableStore};
