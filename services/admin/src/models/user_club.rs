//! User-club association model
//!
//! An association records the member number of a user in a club. The
//! backend lists them per user under `/user-club/user/:userId` and
//! removes them by `{userId, clubId}` rather than by id.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::models::club::Club;
use crate::resource::Resource;
use crate::validation::{ValidationErrors, validate_required};

/// User-club association entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClub {
    pub id: String,
    pub user_id: String,
    pub club_id: String,
    #[serde(default)]
    pub member_number: String,
}

/// New association payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserClub {
    pub user_id: String,
    pub club_id: String,
    pub member_number: String,
}

/// Association update payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClubPatch {
    pub member_number: String,
}

/// Path listing the associations of one user
pub fn user_clubs_path(user_id: &str) -> String {
    format!("{}/user/{}", UserClub::COLLECTION, user_id)
}

impl Resource for UserClub {
    type Draft = NewUserClub;
    type Patch = UserClubPatch;

    const COLLECTION: &'static str = "/user-club";
    const LABEL: &'static str = "club membership";
    const DELETE_BY_BODY: bool = true;

    fn id(&self) -> &str {
        &self.id
    }

    fn validate_draft(draft: &NewUserClub, loaded: &[Self]) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(
            "memberNumber",
            validate_required("Member number", &draft.member_number),
        );

        let club = validate_required("Club", &draft.club_id).and_then(|_| {
            if loaded
                .iter()
                .any(|uc| uc.user_id == draft.user_id && uc.club_id == draft.club_id)
            {
                Err("The club is already associated with the user".to_string())
            } else {
                Ok(())
            }
        });
        errors.check("clubId", club);
        errors.into_result()
    }

    fn validate_patch(
        _id: &str,
        patch: &UserClubPatch,
        _loaded: &[Self],
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(
            "memberNumber",
            validate_required("Member number", &patch.member_number),
        );
        errors.into_result()
    }

    fn delete_body(&self) -> Option<Value> {
        Some(json!({ "userId": self.user_id, "clubId": self.club_id }))
    }
}

/// A club the user belongs to, with the association details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub club: Club,
    pub member_number: String,
    pub user_club_id: Option<String>,
}

/// Join the user's clubs with their associations by club id
///
/// A club without an association keeps an empty member number.
pub fn merge_memberships(clubs: Vec<Club>, associations: &[UserClub]) -> Vec<Membership> {
    clubs
        .into_iter()
        .map(|club| {
            let found = associations.iter().find(|uc| uc.club_id == club.id);
            Membership {
                member_number: found.map(|uc| uc.member_number.clone()).unwrap_or_default(),
                user_club_id: found.map(|uc| uc.id.clone()),
                club,
            }
        })
        .collect()
}
