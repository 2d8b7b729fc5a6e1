use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// How the admin authenticates with the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i16)]
pub enum ProviderType {
    #[default]
    Unknown = 0,
    Email = 1,
    OAuth = 2,
}

impl ProviderType {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(value: i16) -> Self {
        match value {
            1 => ProviderType::Email,
            2 => ProviderType::OAuth,
            _ => ProviderType::Unknown,
        }
    }
}

impl Serialize for ProviderType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i16(self.as_i16())
    }
}

impl<'de> Deserialize<'de> for ProviderType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i16::deserialize(deserializer).map(ProviderType::from_i16)
    }
}

/// Durable admin identity record.
///
/// `id` and `provider_subject` never change after creation. `verified_at` is
/// set once and never cleared. Reads only ever return live records, so
/// `deleted_at` is unset on anything handed out by a store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Admin {
    pub id: String,
    pub provider_subject: String,
    pub provider_type: ProviderType,
    pub email: String,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Inputs for a new admin record.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub id: String,
    pub provider_subject: String,
    pub provider_type: ProviderType,
    pub email: String,
    pub phone_number: Option<String>,
}

impl Admin {
    /// Build a record stamped at `now`. OAuth identities are attested by the
    /// provider and start verified.
    pub fn new(params: NewAdmin, now: DateTime<Utc>) -> Self {
        let verified_at = match params.provider_type {
            ProviderType::OAuth => Some(now),
            _ => None,
        };
        Self {
            id: params.id,
            provider_subject: params.provider_subject,
            provider_type: params.provider_type,
            email: params.email,
            phone_number: params.phone_number.filter(|p| !p.is_empty()),
            created_at: now,
            updated_at: now,
            verified_at,
            deleted_at: None,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }

    /// Phone number in E.164 form: the leading domestic `0` becomes `+81`.
    pub fn international_phone_number(&self) -> Option<String> {
        self.phone_number
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| p.replacen('0', "+81", 1))
    }
}

/// Column projection hint for store reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminField {
    Id,
    ProviderSubject,
    ProviderType,
    Email,
    PhoneNumber,
    CreatedAt,
    UpdatedAt,
    VerifiedAt,
}

impl AdminField {
    pub const ALL: [AdminField; 8] = [
        AdminField::Id,
        AdminField::ProviderSubject,
        AdminField::ProviderType,
        AdminField::Email,
        AdminField::PhoneNumber,
        AdminField::CreatedAt,
        AdminField::UpdatedAt,
        AdminField::VerifiedAt,
    ];

    pub fn column(self) -> &'static str {
        match self {
            AdminField::Id => "id",
            AdminField::ProviderSubject => "provider_subject",
            AdminField::ProviderType => "provider_type",
            AdminField::Email => "email",
            AdminField::PhoneNumber => "phone_number",
            AdminField::CreatedAt => "created_at",
            AdminField::UpdatedAt => "updated_at",
            AdminField::VerifiedAt => "verified_at",
        }
    }

    /// Resolve a projection; an empty slice means every column.
    pub fn resolve(fields: &[AdminField]) -> &[AdminField] {
        if fields.is_empty() {
            &Self::ALL
        } else {
            fields
        }
    }
}

impl Admin {
    /// Copy of this record with only the projected columns populated.
    pub fn project(&self, fields: &[AdminField]) -> Admin {
        let mut out = Admin::default();
        for field in AdminField::resolve(fields) {
            match field {
                AdminField::Id => out.id = self.id.clone(),
                AdminField::ProviderSubject => out.provider_subject = self.provider_subject.clone(),
                AdminField::ProviderType => out.provider_type = self.provider_type,
                AdminField::Email => out.email = self.email.clone(),
                AdminField::PhoneNumber => out.phone_number = self.phone_number.clone(),
                AdminField::CreatedAt => out.created_at = self.created_at,
                AdminField::UpdatedAt => out.updated_at = self.updated_at,
                AdminField::VerifiedAt => out.verified_at = self.verified_at,
            }
        }
        out
    }
}
