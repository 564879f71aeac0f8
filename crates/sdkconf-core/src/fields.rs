//! Static pairing of configuration fields with the cookies that carry them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigField {
    #[serde(rename = "apiKey")]
    ApiKey,
    #[serde(rename = "authDomain")]
    AuthDomain,
    #[serde(rename = "databaseURL")]
    DatabaseUrl,
    #[serde(rename = "projectId")]
    ProjectId,
    #[serde(rename = "storageBucket")]
    StorageBucket,
    #[serde(rename = "messagingSenderId")]
    MessagingSenderId,
    #[serde(rename = "appId")]
    AppId,
    #[serde(rename = "measurementId")]
    MeasurementId,
}

/// (field, cookie name, SDK property name)
pub static FIELD_TABLE: [(ConfigField, &str, &str); 8] = [
    (ConfigField::ApiKey, "XSRF-TOKEN-AK", "apiKey"),
    (ConfigField::AuthDomain, "XSRF-TOKEN-AD", "authDomain"),
    (ConfigField::DatabaseUrl, "XSRF-TOKEN-DU", "databaseURL"),
    (ConfigField::ProjectId, "XSRF-TOKEN-PI", "projectId"),
    (ConfigField::StorageBucket, "XSRF-TOKEN-SB", "storageBucket"),
    (ConfigField::MessagingSenderId, "XSRF-TOKEN-MS", "messagingSenderId"),
    (ConfigField::AppId, "XSRF-TOKEN-AI", "appId"),
    (ConfigField::MeasurementId, "XSRF-TOKEN-MI", "measurementId"),
];

pub const REQUIRED_FIELDS: [ConfigField; 3] = [
    ConfigField::ApiKey,
    ConfigField::AuthDomain,
    ConfigField::ProjectId,
];

impl ConfigField {
    pub const ALL: [ConfigField; 8] = [
        ConfigField::ApiKey,
        ConfigField::AuthDomain,
        ConfigField::DatabaseUrl,
        ConfigField::ProjectId,
        ConfigField::StorageBucket,
        ConfigField::MessagingSenderId,
        ConfigField::AppId,
        ConfigField::MeasurementId,
    ];

    fn row(self) -> &'static (ConfigField, &'static str, &'static str) {
        // FIELD_TABLE is ordered like ALL
        &FIELD_TABLE[self as usize]
    }

    pub fn cookie_name(self) -> &'static str {
        self.row().1
    }

    pub fn property(self) -> &'static str {
        self.row().2
    }

    pub fn is_required(self) -> bool {
        REQUIRED_FIELDS.contains(&self)
    }

    pub fn from_cookie_name(name: &str) -> Option<Self> {
        FIELD_TABLE
            .iter()
            .find(|(_, cookie, _)| *cookie == name)
            .map(|(field, _, _)| *field)
    }

    pub fn from_property(property: &str) -> Option<Self> {
        FIELD_TABLE
            .iter()
            .find(|(_, _, prop)| *prop == property)
            .map(|(field, _, _)| *field)
    }
}

impl std::fmt::Display for ConfigField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.property())
    }
}
