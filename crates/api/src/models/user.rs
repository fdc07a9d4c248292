//! User domain types.
//!
//! These types represent validated domain objects separate from database
//! row types and from raw request payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rollcall_core::{Email, Phone, UserId, UserName, ValidationError};

/// A stored user record (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Store-assigned identity.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Unique email address.
    pub email: Email,
    /// Optional phone number; omitted from JSON when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last mutated.
    pub updated_at: DateTime<Utc>,
}

/// A validated user ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: UserName,
    pub email: Email,
    pub phone: Option<Phone>,
}

/// A validated partial update.
///
/// `None` means "leave the column untouched", never "set it to NULL".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<UserName>,
    pub email: Option<Email>,
    pub phone: Option<Phone>,
}

impl UserChanges {
    /// Whether no field was supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

/// One page of users plus the totals needed to page through the rest.
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub data: Vec<User>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

/// Payload for `POST /api/users`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CreateUserRequest {
    /// Validate every field, reporting the first violation.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name, email or phone is rejected.
    pub fn validate(self) -> Result<NewUser, ValidationError> {
        Ok(NewUser {
            name: UserName::parse(&self.name)?,
            email: Email::parse(&self.email)?,
            phone: self.phone.as_deref().map(Phone::parse).transpose()?,
        })
    }
}

/// Payload for `PUT /api/users/{id}`.
///
/// A missing key and an explicit `null` both mean "not supplied".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl UpdateUserRequest {
    /// Validate the supplied fields, reporting the first violation.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a supplied name, email or phone is rejected.
    pub fn validate(self) -> Result<UserChanges, ValidationError> {
        Ok(UserChanges {
            name: self.name.as_deref().map(UserName::parse).transpose()?,
            email: self.email.as_deref().map(Email::parse).transpose()?,
            phone: self.phone.as_deref().map(Phone::parse).transpose()?,
        })
    }
}
