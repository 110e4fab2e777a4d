//! User type model

use serde::{Deserialize, Serialize};

use crate::resource::Resource;
use crate::validation::{ValidationErrors, validate_required};

/// User type entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserType {
    pub id: String,
    pub name: String,
}

/// New user type payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUserType {
    pub name: String,
}

/// User type update payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserTypePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Resource for UserType {
    type Draft = NewUserType;
    type Patch = UserTypePatch;

    const COLLECTION: &'static str = "/user-types";
    const LABEL: &'static str = "user type";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_draft(draft: &NewUserType, _loaded: &[Self]) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("name", validate_required("Name", &draft.name));
        errors.into_result()
    }

    fn validate_patch(
        _id: &str,
        patch: &UserTypePatch,
        _loaded: &[Self],
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &patch.name {
            errors.check("name", validate_required("Name", name));
        }
        errors.into_result()
    }
}
