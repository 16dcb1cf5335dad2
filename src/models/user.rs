// src/models/user.rs
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::utils::geo::parse_coordinate;

/// A registered user as stored under the `users` collection.
///
/// Only the fields the nearby fanout reads are modelled; other fields are ignored.
/// Malformed values deserialize as absent so one bad record cannot fail a snapshot.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(from = "StoredUser")]
pub struct UserRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(rename = "fcmToken", skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
}

/// Document shape as written by the apps. Older clients write `pushToken`.
#[derive(Deserialize)]
struct StoredUser {
    #[serde(default, deserialize_with = "lenient_coordinate")]
    latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    longitude: Option<f64>,
    #[serde(default, rename = "fcmToken", deserialize_with = "lenient_token")]
    fcm_token: Option<String>,
    #[serde(default, rename = "pushToken", deserialize_with = "lenient_token")]
    legacy_token: Option<String>,
}

impl From<StoredUser> for UserRecord {
    fn from(stored: StoredUser) -> Self {
        let push_token = stored
            .fcm_token
            .filter(|t| !t.trim().is_empty())
            .or(stored.legacy_token);

        Self {
            latitude: stored.latitude,
            longitude: stored.longitude,
            push_token,
        }
    }
}

impl UserRecord {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>, push_token: Option<&str>) -> Self {
        Self {
            latitude,
            longitude,
            push_token: push_token.map(str::to_string),
        }
    }

    /// Location and token, when the user has all three.
    pub fn address(&self) -> Option<(f64, f64, &str)> {
        let lat = self.latitude.filter(|v| v.is_finite())?;
        let lon = self.longitude.filter(|v| v.is_finite())?;
        let token = self.push_token.as_deref().filter(|t| !t.trim().is_empty())?;
        Some((lat, lon, token))
    }

    pub fn is_addressable(&self) -> bool {
        self.address().is_some()
    }
}

fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_coordinate))
}

fn lenient_token<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(token)) => Some(token),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_store_document() {
        let user: UserRecord = serde_json::from_value(json!({
            "name": "Ama",
            "latitude": 5.6037,
            "longitude": -0.187,
            "fcmToken": "tok-ama",
        }))
        .unwrap();

        assert_eq!(user.address(), Some((5.6037, -0.187, "tok-ama")));
    }

    #[test]
    fn test_push_token_alias() {
        let user: UserRecord = serde_json::from_value(json!({
            "latitude": 1.0, "longitude": 2.0, "pushToken": "tok-1"
        }))
        .unwrap();
        assert_eq!(user.push_token.as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_both_token_fields_prefer_fcm_token() {
        let user: UserRecord = serde_json::from_value(json!({
            "latitude": 1.0, "longitude": 1.0, "fcmToken": "t1", "pushToken": "t1-old"
        }))
        .unwrap();
        assert_eq!(user.address(), Some((1.0, 1.0, "t1")));

        let blank_fcm: UserRecord = serde_json::from_value(json!({
            "latitude": 1.0, "longitude": 1.0, "fcmToken": "", "pushToken": "t1-old"
        }))
        .unwrap();
        assert_eq!(blank_fcm.push_token.as_deref(), Some("t1-old"));
    }

    #[test]
    fn test_address_returns_stored_token_unchanged() {
        let user = UserRecord::new(Some(1.0), Some(2.0), Some(" tok-padded\n"));
        assert_eq!(user.address(), Some((1.0, 2.0, " tok-padded\n")));
    }

    #[test]
    fn test_malformed_fields_become_absent() {
        let user: UserRecord = serde_json::from_value(json!({
            "latitude": "somewhere",
            "longitude": null,
            "fcmToken": 12345,
        }))
        .unwrap();

        assert_eq!(user, UserRecord::default());
        assert!(!user.is_addressable());
    }

    #[test]
    fn test_addressable_requires_all_fields() {
        assert!(UserRecord::new(Some(1.0), Some(1.0), Some("t")).is_addressable());
        assert!(!UserRecord::new(None, Some(1.0), Some("t")).is_addressable());
        assert!(!UserRecord::new(Some(1.0), None, Some("t")).is_addressable());
        assert!(!UserRecord::new(Some(1.0), Some(1.0), None).is_addressable());
        assert!(!UserRecord::new(Some(1.0), Some(1.0), Some("  ")).is_addressable());
        assert!(!UserRecord::new(Some(f64::NAN), Some(1.0), Some("t")).is_addressable());
    }

    #[test]
    fn test_serialize_uses_store_field_names() {
        let value = serde_json::to_value(UserRecord::new(Some(1.0), Some(2.0), Some("t"))).unwrap();
        assert_eq!(value, json!({"latitude": 1.0, "longitude": 2.0, "fcmToken": "t"}));
    }
}
