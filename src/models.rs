use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;

pub const DEFAULT_STATUS: &str = "pending_approval";
pub const DEFAULT_MAX_DAILY_SPEND: f64 = 50.0;

// ============ Stored records ============

/// An advertising creative and its lifecycle status.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ad {
    pub id: i64,
    pub service_type: String,
    pub location: String,
    pub status: String,
    pub campaign_id: Option<String>,
    pub ad_set_id: Option<String>,
    pub fb_ad_ids: Option<String>,
    pub budget: Option<f64>,
    pub max_daily_spend: Option<f64>,
    pub image_url: Option<String>,
    pub customer_phone: Option<String>,
    pub ad_content: Option<String>,
    pub metadata: Option<String>,
    pub error_details: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An inbound sales lead tied to an ad or campaign.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lead {
    pub id: i64,
    pub lead_id: Option<String>,
    pub campaign_id: Option<String>,
    pub ad_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub zip_code: Option<String>,
    pub service_interest: Option<String>,
    pub message: Option<String>,
    pub created_time: Option<String>,
    pub logged_at: DateTime<Utc>,
}

// ============ Ingress values ============

/// A field that may arrive either as plain text or as structured JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum TextOrValue {
    Text(String),
    Structured(Value),
}

impl TextOrValue {
    /// `null` and absent values carry nothing.
    pub fn from_json(value: Option<Value>) -> Option<Self> {
        match value {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(TextOrValue::Text(text)),
            Some(other) => Some(TextOrValue::Structured(other)),
        }
    }

    /// Canonical stored form: text verbatim, structured values as compact JSON.
    pub fn into_stored(self) -> String {
        match self {
            TextOrValue::Text(text) => text,
            TextOrValue::Structured(value) => value.to_string(),
        }
    }
}

/// Caller-supplied ad metadata, decoded once at the boundary.
///
/// Only `service_type` is mandatory. The remaining projected fields fall back
/// to: `location` = "", `max_daily_spend` = 50, `image_url`/`customer_phone` = NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct AdMetadata {
    pub service_type: String,
    pub location: Option<String>,
    pub max_daily_spend: Option<f64>,
    pub image_url: Option<String>,
    pub customer_phone: Option<String>,
    /// The full decoded object, stored as-is.
    pub raw: Map<String, Value>,
}

impl AdMetadata {
    pub fn decode(input: TextOrValue) -> Result<Self, AppError> {
        let value = match input {
            TextOrValue::Text(text) => serde_json::from_str::<Value>(&text).map_err(|e| {
                AppError::validation(format!("metadata is not valid JSON: {}", e))
            })?,
            TextOrValue::Structured(value) => value,
        };

        let Value::Object(raw) = value else {
            return Err(AppError::validation("metadata must be a JSON object"));
        };

        let service_type = raw
            .get("service_type")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::validation("metadata.service_type is required"))?
            .to_string();

        Ok(Self {
            service_type,
            location: raw.get("location").cloned().and_then(stringify_value),
            max_daily_spend: raw.get("max_daily_spend").and_then(numeric_value),
            image_url: raw.get("image_url").cloned().and_then(stringify_value),
            customer_phone: raw.get("customer_phone").cloned().and_then(stringify_value),
            raw,
        })
    }

    pub fn stored(&self) -> String {
        Value::Object(self.raw.clone()).to_string()
    }
}

/// Column values for a new `ads` row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAd {
    pub service_type: String,
    pub location: String,
    pub status: String,
    pub budget: Option<f64>,
    pub max_daily_spend: f64,
    pub image_url: Option<String>,
    pub customer_phone: Option<String>,
    pub ad_content: Option<String>,
    pub metadata: String,
}

impl NewAd {
    /// Builds the row from an ad-creation webhook body.
    ///
    /// Validation failures echo the received body back to the caller.
    pub fn from_webhook(payload: &Value) -> Result<Self, AppError> {
        let Some(body) = payload.as_object() else {
            return Err(AppError::validation("request body must be a JSON object")
                .with_received(payload.clone()));
        };

        let metadata = TextOrValue::from_json(body.get("metadata").cloned())
            .ok_or_else(|| AppError::validation("metadata.service_type is required"))
            .and_then(AdMetadata::decode)
            .map_err(|e| e.with_received(payload.clone()))?;

        let status = body
            .get("status")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STATUS)
            .to_string();

        Ok(Self {
            service_type: metadata.service_type.clone(),
            location: metadata.location.clone().unwrap_or_default(),
            status,
            budget: body.get("budget").and_then(numeric_value),
            max_daily_spend: metadata.max_daily_spend.unwrap_or(DEFAULT_MAX_DAILY_SPEND),
            image_url: metadata.image_url.clone(),
            customer_phone: metadata.customer_phone.clone(),
            ad_content: TextOrValue::from_json(body.get("ad_content").cloned())
                .map(TextOrValue::into_stored),
            metadata: metadata.stored(),
        })
    }
}

// ============ Partial update ============

/// Columns a partial update may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdField {
    Status,
    CampaignId,
    AdSetId,
    FbAdIds,
    Notes,
    ErrorDetails,
}

impl AdField {
    pub const ALL: [AdField; 6] = [
        AdField::Status,
        AdField::CampaignId,
        AdField::AdSetId,
        AdField::FbAdIds,
        AdField::Notes,
        AdField::ErrorDetails,
    ];

    pub fn column(self) -> &'static str {
        match self {
            AdField::Status => "status",
            AdField::CampaignId => "campaign_id",
            AdField::AdSetId => "ad_set_id",
            AdField::FbAdIds => "fb_ad_ids",
            AdField::Notes => "notes",
            AdField::ErrorDetails => "error_details",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column() == key)
    }
}

/// Allow-listed changes extracted from an arbitrary JSON body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdUpdate {
    changes: Vec<(AdField, Option<String>)>,
}

impl AdUpdate {
    /// Keeps only allow-listed keys; everything else is dropped silently.
    pub fn from_json(body: Map<String, Value>) -> Self {
        let mut changes: Vec<(AdField, Option<String>)> = body
            .into_iter()
            .filter_map(|(key, value)| {
                AdField::from_key(&key).map(|field| (field, stringify_value(value)))
            })
            .collect();
        // Stable column order keeps generated SQL deterministic.
        changes.sort_by_key(|(field, _)| AdField::ALL.iter().position(|f| f == field));

        Self { changes }
    }

    pub fn set(mut self, field: AdField, value: Option<String>) -> Self {
        self.changes.retain(|(f, _)| *f != field);
        self.changes.push((field, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes(&self) -> &[(AdField, Option<String>)] {
        &self.changes
    }
}

// ============ Leads ============

/// Lead submission body. Numeric values are accepted for every field.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct NewLead {
    #[serde(default, deserialize_with = "lenient_string")]
    pub lead_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub campaign_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ad_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub zip_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub service_interest: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_time: Option<String>,
}

// ============ Responses ============

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// ============ Helpers ============

/// Stored string form of a loose JSON value; `null` becomes `None`.
pub fn stringify_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Finite numbers, or strings holding one.
fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(stringify_value))
}
