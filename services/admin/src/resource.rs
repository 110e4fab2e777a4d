//! Resources managed through the generic controller

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::validation::ValidationErrors;

/// An entity exposed by the backend as a REST collection
pub trait Resource: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Payload sent to create an entity
    type Draft: Serialize + Send + Sync;

    /// Payload sent to update an entity
    type Patch: Serialize + Send + Sync;

    /// Collection path, e.g. `/clubs`
    const COLLECTION: &'static str;

    /// Human label used in messages, e.g. `club`
    const LABEL: &'static str;

    fn id(&self) -> &str;

    /// Check a creation payload against the currently loaded entities
    fn validate_draft(draft: &Self::Draft, loaded: &[Self]) -> Result<(), ValidationErrors>;

    /// Check an update payload for entity `id` against the loaded entities
    fn validate_patch(id: &str, patch: &Self::Patch, loaded: &[Self])
    -> Result<(), ValidationErrors>;

    /// Whether the backend only deletes this entity through a body sent to
    /// the collection; such an entity must be loaded to be deleted
    const DELETE_BY_BODY: bool = false;

    /// Body identifying this entity on deletion; `None` deletes by id
    fn delete_body(&self) -> Option<Value> {
        None
    }
}

/// Path of a single entity
pub fn item_path<R: Resource>(id: &str) -> String {
    format!("{}/{}", R::COLLECTION, id)
}
