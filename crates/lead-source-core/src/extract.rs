use chrono::SecondsFormat;

use crate::environment::CaptureEnvironment;
use crate::options::CaptureOptions;
use crate::record::{AdNetwork, LeadSourceRecord, UtmParam};
use crate::sanitize::sanitize_value;

/// Builds a record from the environment, limited to the enabled categories.
///
/// A field appears only if its category is enabled and the environment had
/// a non-empty value for it. Calling this twice against the same environment
/// yields the same record apart from `landed_at`.
pub fn extract_lead_source<E>(environment: &E, options: &CaptureOptions) -> LeadSourceRecord
where
    E: CaptureEnvironment + ?Sized,
{
    let mut record = LeadSourceRecord::default();

    if options.utm || options.ad_click_ids {
        let params = environment.query_params();
        if options.utm {
            for param in UtmParam::ALL {
                if let Some(value) = clean(params.get(param.as_str()), options) {
                    record.set_utm(param, value);
                }
            }
        }
        if options.ad_click_ids {
            for network in AdNetwork::ALL {
                if let Some(value) = clean(params.get(network.query_param()), options) {
                    record.set_click_id(network, value);
                }
            }
        }
    }

    if options.referrer {
        record.referrer = environment
            .referrer()
            .filter(|referrer| !referrer.trim().is_empty());
    }

    if options.page {
        record.page = environment.path();
    }

    if options.device {
        if let Some(device) = environment.device_info() {
            record.language = Some(device.language);
            record.timezone = Some(device.timezone);
            record.screen_width = Some(device.screen_width);
            record.screen_height = Some(device.screen_height);
            record.user_agent = Some(device.user_agent);
        }
    }

    if options.timestamp {
        record.landed_at = Some(
            environment
                .now()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        );
    }

    record
}

fn clean(raw: Option<&str>, options: &CaptureOptions) -> Option<String> {
    let value = sanitize_value(raw?, options.max_value_length);
    (!value.is_empty()).then_some(value)
}
