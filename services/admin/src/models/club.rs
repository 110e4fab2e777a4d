//! Club model and related functionality

use serde::{Deserialize, Serialize};

use crate::resource::Resource;
use crate::validation::{
    MIN_CLUB_NAME_LENGTH, ValidationErrors, validate_min_length, validate_optional_email,
    validate_optional_phone, validate_required, validate_unique_name,
};

/// Club entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Club {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Data-URL or URL of the club logo
    #[serde(default)]
    pub logo: Option<String>,
}

/// Club form, sent as-is for both creation and update
///
/// Optional fields travel as empty strings when left blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubDraft {
    pub name: String,
    pub description: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub logo: String,
}

impl ClubDraft {
    /// A draft with only the name filled in
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Prefill the edit form from an existing club
    pub fn from_club(club: &Club) -> Self {
        Self {
            name: club.name.clone(),
            description: club.description.clone().unwrap_or_default(),
            address: club.address.clone().unwrap_or_default(),
            phone: club.phone.clone().unwrap_or_default(),
            email: club.email.clone().unwrap_or_default(),
            logo: club.logo.clone().unwrap_or_default(),
        }
    }
}

fn validate_club<'a>(
    draft: &ClubDraft,
    others: impl IntoIterator<Item = &'a Club>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = validate_required("Name", &draft.name)
        .and_then(|_| validate_min_length("Name", &draft.name, MIN_CLUB_NAME_LENGTH))
        .and_then(|_| {
            validate_unique_name(
                Club::LABEL,
                &draft.name,
                others.into_iter().map(|c| c.name.as_str()),
            )
        });

    errors
        .check("name", name)
        .check("phone", validate_optional_phone(&draft.phone))
        .check("email", validate_optional_email(&draft.email));
    errors.into_result()
}

impl Resource for Club {
    type Draft = ClubDraft;
    type Patch = ClubDraft;

    const COLLECTION: &'static str = "/clubs";
    const LABEL: &'static str = "club";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_draft(draft: &ClubDraft, loaded: &[Self]) -> Result<(), ValidationErrors> {
        validate_club(draft, loaded)
    }

    fn validate_patch(
        id: &str,
        patch: &ClubDraft,
        loaded: &[Self],
    ) -> Result<(), ValidationErrors> {
        validate_club(patch, loaded.iter().filter(|c| c.id != id))
    }
}
