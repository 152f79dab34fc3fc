//! Request payloads and query strings for `/api/setting/members`.
//!
//! Bodies are validated with `validator` so every problem is reported at once as
//! `"<field>: <message>"`. Query strings arrive as raw strings and are checked here for
//! the same reason.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::config::PaginationConfig;
use crate::database::models::{Gender, MEMBER_ORDER_FIELDS};
use crate::error::ApiError;
use crate::filter::{FilterError, SortDirection};
use crate::pagination::{offset_for, Cursor, KeysetQuery};
use crate::services::member_service::{ActiveFilter, ListParams, MemberInput, MemberUpdate};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMemberRequest {
    #[validate(custom = "validate_user_id")]
    pub user_id: Option<Value>,
    #[serde(default)]
    #[validate(custom = "validate_name")]
    pub name: String,
    #[serde(default)]
    #[validate(custom = "validate_username")]
    pub username: String,
    #[serde(default)]
    #[validate(custom = "validate_gender")]
    pub gender: String,
    #[serde(default)]
    #[validate(custom = "validate_birthdate")]
    pub birthdate: String,
    #[serde(default)]
    #[validate(custom = "validate_address")]
    pub address: String,
    #[serde(default)]
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[validate(required(message = "Active is required"), custom = "validate_active")]
    pub active: Option<Value>,
}

/// Full replacement of the editable fields. `active` and `photo` keep their stored
/// values when the keys are absent; `photo: null` clears it.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMemberRequest {
    #[validate(custom = "validate_user_id")]
    pub user_id: Option<Value>,
    #[serde(default)]
    #[validate(custom = "validate_name")]
    pub name: String,
    #[serde(default)]
    #[validate(custom = "validate_username")]
    pub username: String,
    #[serde(default)]
    #[validate(custom = "validate_gender")]
    pub gender: String,
    #[serde(default)]
    #[validate(custom = "validate_birthdate")]
    pub birthdate: String,
    #[serde(default)]
    #[validate(custom = "validate_address")]
    pub address: String,
    #[serde(default)]
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[serde(default, deserialize_with = "present")]
    pub photo: Option<Option<String>>,
    #[validate(custom = "validate_active")]
    pub active: Option<Value>,
}

impl CreateMemberRequest {
    pub fn into_input(self) -> Result<MemberInput, ApiError> {
        Ok(MemberInput {
            user_id: convert(self.user_id.as_ref().map(parse_user_id).transpose(), "user_id")?.flatten(),
            gender: convert(self.gender.parse::<Gender>(), "gender")?,
            birthdate: convert(parse_birthdate(&self.birthdate), "birthdate")?,
            active: convert(self.active.as_ref().map(parse_active).transpose(), "active")?.unwrap_or(false),
            name: self.name,
            username: self.username,
            address: self.address,
            phone: self.phone,
            photo: normalize_photo(self.photo),
        })
    }
}

impl UpdateMemberRequest {
    pub fn into_update(self) -> Result<MemberUpdate, ApiError> {
        Ok(MemberUpdate {
            user_id: convert(self.user_id.as_ref().map(parse_user_id).transpose(), "user_id")?.flatten(),
            gender: convert(self.gender.parse::<Gender>(), "gender")?,
            birthdate: convert(parse_birthdate(&self.birthdate), "birthdate")?,
            active: convert(self.active.as_ref().map(parse_active).transpose(), "active")?,
            name: self.name,
            username: self.username,
            address: self.address,
            phone: self.phone,
            photo: self.photo.map(normalize_photo),
        })
    }
}

fn convert<T, E: ToString>(result: Result<T, E>, field: &str) -> Result<T, ApiError> {
    result.map_err(|e| ApiError::validation_error(vec![format!("{}: {}", field, e.to_string())]))
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent key (`None`).
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn normalize_photo(photo: Option<String>) -> Option<String> {
    photo.filter(|p| !p.is_empty() && p != "null")
}

/// Number or numeric string; `0`, `""` and `null` mean "no user".
pub fn parse_user_id(value: &Value) -> Result<Option<i64>, &'static str> {
    const MESSAGE: &str = "User ID must be a number";
    let id = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_i64().ok_or(MESSAGE)?,
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| MESSAGE)?,
        _ => return Err(MESSAGE),
    };
    Ok(Some(id).filter(|id| *id != 0))
}

/// `true|false`, `1|0`, or their string forms.
pub fn parse_active(value: &Value) -> Result<bool, &'static str> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
        Value::String(s) if s == "true" || s == "1" => Ok(true),
        Value::String(s) if s == "false" || s == "0" => Ok(false),
        _ => Err("Active must be true or false"),
    }
}

/// `YYYY-MM-DD`, or an RFC 3339 timestamp whose UTC date is used.
pub fn parse_birthdate(raw: &str) -> Result<NaiveDate, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Birthdate is required");
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc).date_naive()))
        .map_err(|_| "Birthdate must be a valid date")?;
    if date > Utc::now().date_naive() {
        return Err("Birthdate must be before today");
    }
    Ok(date)
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut validation_e = ValidationError::new(code);
    validation_e.message = Some(message.into());
    validation_e
}

fn validate_user_id(value: &Value) -> Result<(), ValidationError> {
    parse_user_id(value).map(|_| ()).map_err(|m| validation_error("user_id", m))
}

fn validate_active(value: &Value) -> Result<(), ValidationError> {
    parse_active(value).map(|_| ()).map_err(|m| validation_error("active", m))
}

fn validate_birthdate(value: &String) -> Result<(), ValidationError> {
    parse_birthdate(value).map(|_| ()).map_err(|m| validation_error("birthdate", m))
}

fn validate_gender(value: &String) -> Result<(), ValidationError> {
    value
        .parse::<Gender>()
        .map(|_| ())
        .map_err(|_| validation_error("gender", "Gender must be either Male or Female"))
}

fn validate_name(value: &String) -> Result<(), ValidationError> {
    match value.chars().count() {
        0 => Err(validation_error("name", "Name is required")),
        n if n > 255 => Err(validation_error("name", "Name cannot exceed 255 characters")),
        _ => Ok(()),
    }
}

fn validate_username(value: &String) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < 3 {
        return Err(validation_error("username", "Username must be at least 3 characters"));
    }
    if len > 255 {
        return Err(validation_error("username", "Username cannot exceed 255 characters"));
    }
    if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(validation_error(
            "username",
            "Username can only contain letters, numbers, underscores, and hyphens",
        ));
    }
    Ok(())
}

fn validate_address(value: &String) -> Result<(), ValidationError> {
    match value.chars().count() {
        0 => Err(validation_error("address", "Address is required")),
        n if n > 500 => Err(validation_error("address", "Address cannot exceed 500 characters")),
        _ => Ok(()),
    }
}

fn validate_phone(value: &String) -> Result<(), ValidationError> {
    match value.chars().count() {
        0 => Err(validation_error("phone", "Phone is required")),
        n if n > 20 => Err(validation_error("phone", "Phone cannot exceed 20 characters")),
        _ => Ok(()),
    }
}

/// Raw `GET /api/setting/members` query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListMembersQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub per_page: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "orderField")]
    pub order_field_camel: Option<String>,
    pub order_field: Option<String>,
    #[serde(rename = "orderDir")]
    pub order_dir_camel: Option<String>,
    pub order_dir: Option<String>,
    pub active: Option<String>,
}

/// Raw `GET /api/setting/members/load-more` query string.
#[derive(Debug, Default, Deserialize)]
pub struct LoadMoreQuery {
    pub limit: Option<String>,
    pub cursor: Option<String>,
    pub search: Option<String>,
}

/// Parses an optional integer bounded below by `min` and, when given, above by `max`.
fn bounded_int(
    raw: Option<&str>,
    field: &str,
    label: &str,
    min: i64,
    max: Option<i64>,
    errors: &mut Vec<String>,
) -> Option<i64> {
    let raw = raw?.trim();
    let Ok(value) = raw.parse::<i64>() else {
        errors.push(format!("{}: {} must be an integer", field, label));
        return None;
    };
    if value < min {
        errors.push(format!("{}: {} must be at least {}", field, label, min));
        return None;
    }
    if let Some(max) = max.filter(|max| value > *max) {
        errors.push(format!("{}: {} cannot exceed {}", field, label, max));
        return None;
    }
    Some(value)
}

fn trimmed(search: Option<String>) -> Option<String> {
    search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl ListMembersQuery {
    pub fn parse(self, config: &PaginationConfig) -> Result<ListParams, ApiError> {
        let mut errors = Vec::new();
        let max = Some(config.max_limit);

        let page = bounded_int(self.page.as_deref(), "page", "Page", 1, None, &mut errors);
        let limit = bounded_int(self.limit.as_deref(), "limit", "Limit", 1, max, &mut errors);
        let per_page = bounded_int(self.per_page.as_deref(), "per_page", "Per page", 1, max, &mut errors);

        let order_fields = MEMBER_ORDER_FIELDS.join(", ");
        let mut order_field = None;
        for (key, raw) in [("orderField", &self.order_field_camel), ("order_field", &self.order_field)] {
            if let Some(raw) = raw {
                if MEMBER_ORDER_FIELDS.contains(&raw.as_str()) {
                    order_field = Some(raw.clone());
                } else {
                    errors.push(format!("{}: Order field must be one of: {}", key, order_fields));
                }
            }
        }

        let mut order_dir = None;
        for (key, raw) in [("orderDir", &self.order_dir_camel), ("order_dir", &self.order_dir)] {
            if let Some(raw) = raw {
                match SortDirection::parse(raw) {
                    Some(dir) => order_dir = Some(dir),
                    None => errors.push(format!("{}: Order direction must be either asc or desc", key)),
                }
            }
        }

        let active = match self.active.as_deref() {
            None | Some("") | Some("all") => ActiveFilter::All,
            Some("active") => ActiveFilter::Active,
            Some("inactive") => ActiveFilter::Inactive,
            Some(_) => {
                errors.push("active: Active filter must be one of: active, inactive, all".to_string());
                ActiveFilter::All
            }
        };

        let page = page.unwrap_or(1);
        let limit = per_page.or(limit).unwrap_or(config.default_limit);
        if offset_for(page, limit).is_none() {
            errors.push("page: Page is too large".to_string());
        }

        if !errors.is_empty() {
            return Err(ApiError::validation_error(errors));
        }

        Ok(ListParams {
            page,
            limit,
            search: trimmed(self.search),
            order: order_field.zip(order_dir),
            active,
        })
    }
}

impl LoadMoreQuery {
    pub fn parse(self, config: &PaginationConfig) -> Result<KeysetQuery, ApiError> {
        let mut errors = Vec::new();
        let limit = bounded_int(self.limit.as_deref(), "limit", "Limit", 1, None, &mut errors);

        let cursor = match self.cursor.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(raw) => match raw.parse::<Cursor>() {
                Ok(cursor) => Some(cursor),
                Err(e) => {
                    errors.push(format!("cursor: {}", e));
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Err(ApiError::validation_error(errors));
        }

        let query = KeysetQuery::new(limit.unwrap_or(config.default_limit)).map_err(|e| {
            let message = match e {
                FilterError::InvalidLimit(message) => message,
                other => other.to_string(),
            };
            ApiError::validation_error(vec![format!("limit: {}", message)])
        })?;
        // Cursor 0 names no row and means "from the start".
        Ok(query
            .after(cursor.filter(|c| c.id() != 0))
            .search(self.search.as_deref()))
    }
}
