//! Role model and related functionality

use serde::{Deserialize, Serialize};

use crate::resource::Resource;
use crate::validation::{ValidationErrors, validate_required};

/// Role entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

/// New role creation payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewRole {
    pub name: String,
}

impl NewRole {
    /// The name is sent trimmed
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
        }
    }
}

/// Role update payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Resource for Role {
    type Draft = NewRole;
    type Patch = RolePatch;

    const COLLECTION: &'static str = "/roles";
    const LABEL: &'static str = "role";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_draft(draft: &NewRole, _loaded: &[Self]) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("name", validate_required("Name", &draft.name));
        errors.into_result()
    }

    fn validate_patch(
        _id: &str,
        patch: &RolePatch,
        _loaded: &[Self],
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &patch.name {
            errors.check("name", validate_required("Name", name));
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_role_is_trimmed() {
        assert_eq!(NewRole::new("  Coach ").name, "Coach");
        assert!(Role::validate_draft(&NewRole::new("   "), &[]).is_err());
    }

    #[test]
    fn test_patch_only_sends_set_fields() {
        let patch = RolePatch {
            is_active: Some(false),
            ..RolePatch::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            serde_json::json!({ "isActive": false })
        );
        assert!(Role::validate_patch("r1", &patch, &[]).is_ok());
    }
}
