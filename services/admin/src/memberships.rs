//! Club memberships of a single user

use tracing::debug;

use crate::client::ApiClient;
use crate::controller::ResourceController;
use crate::error::ClientResult;
use crate::models::{Club, Membership, User, UserClub, merge_memberships, user_clubs_path};
use crate::resource::item_path;

/// A user together with the clubs they belong to
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub memberships: Vec<Membership>,
}

/// Fetch a user and their associations, merged by club id
pub async fn load_profile(client: &ApiClient, user_id: &str) -> ClientResult<Profile> {
    let user_path = item_path::<User>(user_id);
    let associations_path = user_clubs_path(user_id);

    let (user, associations) = tokio::try_join!(
        client.get::<User>(&user_path),
        client.get::<Option<Vec<UserClub>>>(&associations_path),
    )?;
    let associations = associations.unwrap_or_default();
    debug!(
        "User {} has {} clubs and {} associations",
        user_id,
        user.clubs.len(),
        associations.len()
    );

    let memberships = merge_memberships(user.clubs.clone(), &associations);
    Ok(Profile { user, memberships })
}

/// Memberships of a user
pub async fn load_memberships(client: &ApiClient, user_id: &str) -> ClientResult<Vec<Membership>> {
    Ok(load_profile(client, user_id).await?.memberships)
}

/// Controller over the associations of one user
///
/// Lists `/user-club/user/:userId`; creation, update and removal go
/// through `/user-club`.
pub fn user_clubs_controller(client: ApiClient, user_id: &str) -> ResourceController<UserClub> {
    ResourceController::with_list_path(client, user_clubs_path(user_id))
}

/// Pick a club id by id or case-insensitive name among the loaded clubs
pub fn resolve_club<'a>(clubs: &'a [Club], key: &str) -> Option<&'a str> {
    let key = key.trim();
    clubs
        .iter()
        .find(|c| c.id == key)
        .or_else(|| clubs.iter().find(|c| c.name.eq_ignore_ascii_case(key)))
        .map(|c| c.id.as_str())
}
