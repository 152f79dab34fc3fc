use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::filter::{FieldAccess, FilterValue};
use crate::pagination::{Cursor, KeysetRow, KeysetSpec};

pub const MEMBERS_TABLE: &str = "members";

/// Load-more ordering: `name ASC, id DESC`, searching name, username and phone.
pub const MEMBER_KEYSET: KeysetSpec = KeysetSpec {
    table: MEMBERS_TABLE,
    sort_column: "name",
    tie_break_column: "id",
    search_columns: &["name", "username", "phone"],
};

/// Columns a client may order the offset listing by.
pub const MEMBER_ORDER_FIELDS: &[&str] = &[
    "id", "name", "username", "gender", "birthdate", "address", "phone", "active", "created_at", "updated_at",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_gender")]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Female" => Ok(Gender::Female),
            "Male" => Ok(Gender::Male),
            other => Err(format!("Unknown gender: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub username: String,
    pub gender: Gender,
    pub birthdate: NaiveDate,
    pub address: String,
    pub phone: String,
    pub photo: Option<String>,
    pub active: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a row that does not exist yet; ids and timestamps come from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    pub user_id: Option<i64>,
    pub name: String,
    pub username: String,
    pub gender: Gender,
    pub birthdate: NaiveDate,
    pub address: String,
    pub phone: String,
    pub photo: Option<String>,
    pub active: bool,
    pub created_by: i64,
}

/// Fully resolved replacement values for an existing row.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberChanges {
    pub user_id: Option<i64>,
    pub name: String,
    pub username: String,
    pub gender: Gender,
    pub birthdate: NaiveDate,
    pub address: String,
    pub phone: String,
    pub photo: Option<String>,
    pub active: bool,
    pub updated_by: i64,
}

impl FieldAccess for Member {
    fn field(&self, column: &str) -> Option<FilterValue> {
        let value = match column {
            "id" => FilterValue::Int(self.id),
            "user_id" => self.user_id.into(),
            "name" => self.name.as_str().into(),
            "username" => self.username.as_str().into(),
            "gender" => self.gender.as_str().into(),
            "birthdate" => self.birthdate.into(),
            "address" => self.address.as_str().into(),
            "phone" => self.phone.as_str().into(),
            "photo" => self.photo.clone().into(),
            "active" => self.active.into(),
            "created_by" => self.created_by.into(),
            "created_at" => self.created_at.into(),
            "updated_by" => self.updated_by.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        };
        Some(value)
    }
}

impl KeysetRow for Member {
    fn cursor(&self) -> Cursor {
        Cursor::new(self.id)
    }
}
