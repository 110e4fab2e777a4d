//! Entities exchanged with the backend

pub mod club;
pub mod role;
pub mod user;
pub mod user_club;
pub mod user_type;

use serde::{Deserialize, Serialize};

use crate::validation::{ValidationErrors, validate_email, validate_password, validate_required};

pub use club::{Club, ClubDraft};
pub use role::{NewRole, Role, RolePatch};
pub use user::{NewUser, User, UserPatch};
pub use user_club::{
    Membership, NewUserClub, UserClub, UserClubPatch, merge_memberships, user_clubs_path,
};
pub use user_type::{NewUserType, UserType, UserTypePatch};

/// Login request
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response; a missing token is an unexpected answer
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Self-registration payload
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role_id: String,
    pub user_type_id: String,
    /// Ids of the clubs to join
    pub clubs: Vec<String>,
}

impl Registration {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("email", validate_email(&self.email))
            .check("password", validate_password(&self.password))
            .check("firstName", validate_required("First name", &self.first_name))
            .check("lastName", validate_required("Last name", &self.last_name))
            .check("userTypeId", validate_required("User type", &self.user_type_id));
        errors.into_result()
    }
}
