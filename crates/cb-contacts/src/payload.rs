//! Wire shapes of an aggregation result.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::aggregator::AggregationResult;
use crate::backfill::ProfileSummary;
use crate::merge::AggregatedContact;
use crate::signal::ContactSignal;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactsPayload {
    /// Epoch millis of the newest interaction, or `-1`.
    pub last_updated_at: String,
    pub contacts: Vec<ContactPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub contact_address: String,
    pub last_contact_at: String,
    pub metadata: Vec<ContactPointPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_address_profile: Option<ProfilePayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactPointPayload {
    pub name: String,
    pub directions: Vec<String>,
    pub values: Vec<String>,
    pub timestamps: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePayload {
    pub id: i64,
    pub circles_address: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl From<&AggregationResult> for ContactsPayload {
    fn from(result: &AggregationResult) -> Self {
        Self {
            last_updated_at: result.last_updated_at().to_string(),
            contacts: result.contacts().iter().map(ContactPayload::from).collect(),
        }
    }
}

impl From<&AggregatedContact> for ContactPayload {
    fn from(contact: &AggregatedContact) -> Self {
        Self {
            contact_address: contact.counterparty().to_string(),
            last_contact_at: contact.last_interaction_at().to_string(),
            metadata: contact
                .signals()
                .iter()
                .map(ContactPointPayload::from)
                .collect(),
            contact_address_profile: contact.profile().map(ProfilePayload::from),
        }
    }
}

impl From<&ContactSignal> for ContactPointPayload {
    fn from(signal: &ContactSignal) -> Self {
        Self {
            name: signal.name().to_string(),
            directions: signal
                .directions()
                .iter()
                .map(|direction| direction.as_str().to_string())
                .collect(),
            values: signal.values().to_vec(),
            timestamps: signal
                .timestamps()
                .iter()
                .map(|timestamp| timestamp.to_string())
                .collect(),
        }
    }
}

impl From<&ProfileSummary> for ProfilePayload {
    fn from(profile: &ProfileSummary) -> Self {
        Self {
            id: profile.profile_id,
            circles_address: profile.address.clone(),
            display_name: profile.display_name.clone(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{ContactPoint, Direction};
    use crate::timestamp::EpochMillis;
    use serde_json::json;

    #[test]
    fn signal_payload_renders_strings() {
        let signal = ContactSignal::new(ContactPoint::ChatMessage, "0xdef")
            .with_event(Direction::Out, "hello", EpochMillis::new(1000))
            .with_event(Direction::In, "hi", EpochMillis::new(1500));

        let payload = serde_json::to_value(ContactPointPayload::from(&signal)).unwrap();
        assert_eq!(
            payload,
            json!({
                "name": "ChatMessage",
                "directions": ["Out", "In"],
                "values": ["hello", "hi"],
                "timestamps": ["1000", "1500"]
            })
        );
    }

    #[test]
    fn placeholder_payload_includes_profile() {
        let contact = AggregatedContact::search_placeholder(
            ProfileSummary {
                profile_id: 3,
                address: "0xaaa".into(),
                display_name: "Ada".into(),
                avatar_url: Some("https://example.org/ada.png".into()),
            },
            EpochMillis::new(99),
        );

        let payload = serde_json::to_value(ContactPayload::from(&contact)).unwrap();
        assert_eq!(payload["contactAddress"], "0xaaa");
        assert_eq!(payload["lastContactAt"], "99");
        assert_eq!(payload["metadata"][0]["name"], "Search");
        assert_eq!(payload["metadata"][0]["values"], json!([]));
        assert_eq!(payload["contactAddressProfile"]["displayName"], "Ada");
    }
}
