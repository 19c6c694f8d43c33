//! The captured attribution record and the parameter tables that feed it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Campaign (UTM) query parameters, in capture order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UtmParam {
    Source,
    Medium,
    Campaign,
    Term,
    Content,
}

impl UtmParam {
    pub const ALL: [Self; 5] = [
        Self::Source,
        Self::Medium,
        Self::Campaign,
        Self::Term,
        Self::Content,
    ];

    /// Query string name; also the record field name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "utm_source",
            Self::Medium => "utm_medium",
            Self::Campaign => "utm_campaign",
            Self::Term => "utm_term",
            Self::Content => "utm_content",
        }
    }
}

/// Ad networks whose click identifiers are captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdNetwork {
    Google,
    Meta,
    Microsoft,
    TikTok,
    LinkedIn,
    X,
    Snapchat,
    Pinterest,
}

impl AdNetwork {
    pub const ALL: [Self; 8] = [
        Self::Google,
        Self::Meta,
        Self::Microsoft,
        Self::TikTok,
        Self::LinkedIn,
        Self::X,
        Self::Snapchat,
        Self::Pinterest,
    ];

    /// Parameter name the network appends to landing URLs.
    #[must_use]
    pub fn query_param(self) -> &'static str {
        match self {
            Self::Google => "gclid",
            Self::Meta => "fbclid",
            Self::Microsoft => "msclkid",
            Self::TikTok => "ttclid",
            Self::LinkedIn => "li_fat_id",
            Self::X => "twclid",
            Self::Snapchat => "ScCid",
            Self::Pinterest => "epik",
        }
    }

    /// Field name in the persisted record.
    #[must_use]
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Snapchat => "sccid",
            other => other.query_param(),
        }
    }
}

/// Attribution signals captured at landing time.
///
/// Every field is optional and absent fields are left out of the JSON
/// entirely. Members this type does not know about are kept in `extra` so a
/// stored entry written by another producer survives a read unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeadSourceRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gclid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbclid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msclkid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttclid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub li_fat_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twclid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sccid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epik: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub landed_at: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LeadSourceRecord {
    #[must_use]
    pub fn utm(&self, param: UtmParam) -> Option<&str> {
        match param {
            UtmParam::Source => self.utm_source.as_deref(),
            UtmParam::Medium => self.utm_medium.as_deref(),
            UtmParam::Campaign => self.utm_campaign.as_deref(),
            UtmParam::Term => self.utm_term.as_deref(),
            UtmParam::Content => self.utm_content.as_deref(),
        }
    }

    pub fn set_utm(&mut self, param: UtmParam, value: String) {
        let slot = match param {
            UtmParam::Source => &mut self.utm_source,
            UtmParam::Medium => &mut self.utm_medium,
            UtmParam::Campaign => &mut self.utm_campaign,
            UtmParam::Term => &mut self.utm_term,
            UtmParam::Content => &mut self.utm_content,
        };
        *slot = Some(value);
    }

    #[must_use]
    pub fn click_id(&self, network: AdNetwork) -> Option<&str> {
        match network {
            AdNetwork::Google => self.gclid.as_deref(),
            AdNetwork::Meta => self.fbclid.as_deref(),
            AdNetwork::Microsoft => self.msclkid.as_deref(),
            AdNetwork::TikTok => self.ttclid.as_deref(),
            AdNetwork::LinkedIn => self.li_fat_id.as_deref(),
            AdNetwork::X => self.twclid.as_deref(),
            AdNetwork::Snapchat => self.sccid.as_deref(),
            AdNetwork::Pinterest => self.epik.as_deref(),
        }
    }

    pub fn set_click_id(&mut self, network: AdNetwork, value: String) {
        let slot = match network {
            AdNetwork::Google => &mut self.gclid,
            AdNetwork::Meta => &mut self.fbclid,
            AdNetwork::Microsoft => &mut self.msclkid,
            AdNetwork::TikTok => &mut self.ttclid,
            AdNetwork::LinkedIn => &mut self.li_fat_id,
            AdNetwork::X => &mut self.twclid,
            AdNetwork::Snapchat => &mut self.sccid,
            AdNetwork::Pinterest => &mut self.epik,
        };
        *slot = Some(value);
    }

    /// True when no campaign or click identifier was captured.
    #[must_use]
    pub fn is_direct(&self) -> bool {
        UtmParam::ALL.iter().all(|param| self.utm(*param).is_none())
            && AdNetwork::ALL
                .iter()
                .all(|network| self.click_id(*network).is_none())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Fails only when `raw` is not JSON. Any JSON document reads as a record.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Value>(raw).map(Self::from)
    }
}

/// Known members are taken when their type fits. A known member with another
/// type stays in `extra` under its own name, and a document that is not an
/// object reads as an empty record.
impl From<Value> for LeadSourceRecord {
    fn from(value: Value) -> Self {
        let Value::Object(mut members) = value else {
            return Self::default();
        };
        Self {
            utm_source: take_member(&mut members, "utm_source"),
            utm_medium: take_member(&mut members, "utm_medium"),
            utm_campaign: take_member(&mut members, "utm_campaign"),
            utm_term: take_member(&mut members, "utm_term"),
            utm_content: take_member(&mut members, "utm_content"),
            gclid: take_member(&mut members, "gclid"),
            fbclid: take_member(&mut members, "fbclid"),
            msclkid: take_member(&mut members, "msclkid"),
            ttclid: take_member(&mut members, "ttclid"),
            li_fat_id: take_member(&mut members, "li_fat_id"),
            twclid: take_member(&mut members, "twclid"),
            sccid: take_member(&mut members, "sccid"),
            epik: take_member(&mut members, "epik"),
            referrer: take_member(&mut members, "referrer"),
            page: take_member(&mut members, "page"),
            language: take_member(&mut members, "language"),
            timezone: take_member(&mut members, "timezone"),
            screen_width: take_member(&mut members, "screen_width"),
            screen_height: take_member(&mut members, "screen_height"),
            user_agent: take_member(&mut members, "user_agent"),
            landed_at: take_member(&mut members, "landed_at"),
            extra: members,
        }
    }
}

impl<'de> Deserialize<'de> for LeadSourceRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from)
    }
}

fn take_member<T: DeserializeOwned>(members: &mut Map<String, Value>, name: &str) -> Option<T> {
    let value = members.get(name)?;
    if value.is_null() {
        members.remove(name);
        return None;
    }
    let parsed = T::deserialize(value).ok()?;
    members.remove(name);
    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_omitted_not_null() {
        let mut record = LeadSourceRecord::default();
        record.set_utm(UtmParam::Source, "google".to_string());
        record.screen_width = Some(1440);

        let json = record.to_json().expect("serialize");
        assert_eq!(json, r#"{"utm_source":"google","screen_width":1440}"#);
    }

    #[test]
    fn unknown_members_survive_a_read() {
        let record =
            LeadSourceRecord::from_json(r#"{"utm_medium":"cpc","crm_id":"x-9","score":3}"#)
                .expect("parse");
        assert_eq!(record.utm(UtmParam::Medium), Some("cpc"));
        assert_eq!(record.extra.get("crm_id"), Some(&Value::from("x-9")));

        let reparsed = LeadSourceRecord::from_json(&record.to_json().expect("serialize"))
            .expect("reparse");
        assert_eq!(reparsed, record);
    }

    #[test]
    fn snapchat_field_name_differs_from_query_param() {
        assert_eq!(AdNetwork::Snapchat.query_param(), "ScCid");
        assert_eq!(AdNetwork::Snapchat.field_name(), "sccid");

        let mut record = LeadSourceRecord::default();
        record.set_click_id(AdNetwork::Snapchat, "snap-1".to_string());
        assert_eq!(record.to_json().expect("serialize"), r#"{"sccid":"snap-1"}"#);
    }

    #[test]
    fn field_names_are_unique_across_groups() {
        let mut names = UtmParam::ALL
            .iter()
            .map(|param| param.as_str())
            .chain(AdNetwork::ALL.iter().map(|network| network.field_name()))
            .collect::<Vec<_>>();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn direct_visit_has_no_campaign_or_click_fields() {
        let mut record = LeadSourceRecord {
            referrer: Some("https://news.example.com/".to_string()),
            ..LeadSourceRecord::default()
        };
        assert!(record.is_direct());

        record.set_click_id(AdNetwork::Microsoft, "ms-1".to_string());
        assert!(!record.is_direct());
    }

    #[test]
    fn only_malformed_json_is_rejected() {
        assert!(LeadSourceRecord::from_json("{not json").is_err());
        assert_eq!(
            LeadSourceRecord::from_json("[1,2,3]").expect("valid json"),
            LeadSourceRecord::default()
        );
        assert_eq!(
            LeadSourceRecord::from_json("\"hello\"").expect("valid json"),
            LeadSourceRecord::default()
        );
    }

    #[test]
    fn mistyped_members_stay_in_extra() {
        let record = LeadSourceRecord::from_json(
            r#"{"utm_source":42,"utm_medium":"email","screen_width":"1440"}"#,
        )
        .expect("valid json");
        assert_eq!(record.utm_source, None);
        assert_eq!(record.utm_medium.as_deref(), Some("email"));
        assert_eq!(record.screen_width, None);
        assert_eq!(record.extra.get("utm_source"), Some(&Value::from(42)));
        assert_eq!(record.extra.get("screen_width"), Some(&Value::from("1440")));

        let written: Value =
            serde_json::from_str(&record.to_json().expect("serialize")).expect("valid json");
        assert_eq!(written["utm_source"], 42);
        assert_eq!(written["screen_width"], "1440");
    }

    #[test]
    fn null_members_read_as_absent() {
        let record = LeadSourceRecord::from_json(r#"{"gclid":null,"page":"/"}"#)
            .expect("valid json");
        assert_eq!(record.gclid, None);
        assert!(record.extra.is_empty());
    }
}
