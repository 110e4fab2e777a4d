//! User model and related functionality

use serde::{Deserialize, Serialize};

use crate::models::club::Club;
use crate::resource::Resource;
use crate::validation::{ValidationErrors, validate_email, validate_password, validate_required};

/// User entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub role_id: Option<String>,
    #[serde(default)]
    pub user_type_id: Option<String>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    /// Clubs the user belongs to, only filled in by `GET /users/:id`
    #[serde(default)]
    pub clubs: Vec<Club>,
}

fn active_by_default() -> bool {
    true
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// New user creation payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: String,
    pub user_type_id: String,
}

/// User update payload; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserPatch {
    /// Patch toggling only the active flag
    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }
}

impl Resource for User {
    type Draft = NewUser;
    type Patch = UserPatch;

    const COLLECTION: &'static str = "/users";
    const LABEL: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_draft(draft: &NewUser, _loaded: &[Self]) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("email", validate_email(&draft.email))
            .check("password", validate_password(&draft.password))
            .check("firstName", validate_required("First name", &draft.first_name))
            .check("lastName", validate_required("Last name", &draft.last_name))
            .check("roleId", validate_required("Role", &draft.role_id))
            .check("userTypeId", validate_required("User type", &draft.user_type_id));
        errors.into_result()
    }

    fn validate_patch(
        _id: &str,
        patch: &UserPatch,
        _loaded: &[Self],
    ) -> Result<(), ValidationErrors> {
        let fields = [
            ("firstName", "First name", &patch.first_name),
            ("lastName", "Last name", &patch.last_name),
            ("roleId", "Role", &patch.role_id),
            ("userTypeId", "User type", &patch.user_type_id),
        ];

        let mut errors = ValidationErrors::new();
        for (field, label, value) in fields {
            if let Some(value) = value {
                errors.check(field, validate_required(label, value));
            }
        }
        errors.into_result()
    }
}
