//! Generic list/form controller for a backend collection
//!
//! A controller holds the state of one administration screen: the loaded
//! list, the create/edit form and the delete confirmation. Every
//! successful mutation is followed by a full reload of the list.
//!
//! State lives behind an async mutex that is only held between network
//! calls, never across one. Requests race against the controller's
//! lifetime token, so nothing touches the state once `teardown` ran.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use common::SessionGuard;
use serde::de::IgnoredAny;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::error::{ClientResult, ControllerError, ControllerResult};
use crate::resource::{Resource, item_path};

/// Whether the list is being fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
}

/// Create/edit dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormModal {
    Closed,
    Creating,
    Editing { id: String },
}

/// Delete confirmation dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmDialog {
    Closed,
    ConfirmingDelete { id: String },
}

/// Outcome of the session check on mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    /// The stored session is gone; the user must log in again
    RedirectToLogin,
}

/// Everything a screen displays
#[derive(Debug, Clone)]
pub struct ScreenState<R> {
    pub load: LoadState,
    pub items: Vec<R>,
    /// Screen-level error, from loading or deleting
    pub error: Option<String>,
    pub form: FormModal,
    pub form_error: Option<String>,
    pub confirm: ConfirmDialog,
    /// A mutation is in flight
    pub processing: bool,
    pub session: SessionState,
}

impl<R> Default for ScreenState<R> {
    fn default() -> Self {
        Self {
            load: LoadState::Loading,
            items: Vec::new(),
            error: None,
            form: FormModal::Closed,
            form_error: None,
            confirm: ConfirmDialog::Closed,
            processing: false,
            session: SessionState::Active,
        }
    }
}

/// Where a failed mutation reports its message
#[derive(Debug, Clone, Copy)]
enum ErrorSlot {
    Screen,
    Form,
}

/// Controller for the collection of `R`
#[derive(Debug)]
pub struct ResourceController<R: Resource> {
    client: ApiClient,
    list_path: String,
    state: Mutex<ScreenState<R>>,
    list_epoch: AtomicU64,
    lifetime: CancellationToken,
}

impl<R: Resource> ResourceController<R> {
    /// Controller listing the whole collection
    pub fn new(client: ApiClient) -> Self {
        Self::with_list_path(client, R::COLLECTION)
    }

    /// Controller listing from `list_path` while mutating the collection
    pub fn with_list_path(client: ApiClient, list_path: impl Into<String>) -> Self {
        Self {
            client,
            list_path: list_path.into(),
            state: Mutex::new(ScreenState::default()),
            list_epoch: AtomicU64::new(0),
            lifetime: CancellationToken::new(),
        }
    }

    /// Copy of the current screen state
    pub async fn snapshot(&self) -> ScreenState<R> {
        self.state.lock().await.clone()
    }

    /// Check the session, then load the list
    ///
    /// Without a guard the list is loaded unconditionally.
    pub async fn mount(&self, guard: Option<&SessionGuard>) -> ControllerResult<()> {
        if let Some(guard) = guard {
            if let Err(e) = guard.check() {
                warn!("Refusing to load {}s: {}", R::LABEL, e);
                let mut state = self.state.lock().await;
                state.session = SessionState::RedirectToLogin;
                state.load = LoadState::Ready;
                state.error = Some(e.to_string());
                return Err(e.into());
            }
        }

        self.list().await
    }

    /// Fetch the list, replacing the loaded items
    ///
    /// A response is dropped when a newer `list` call started meanwhile.
    pub async fn list(&self) -> ControllerResult<()> {
        let epoch = self.list_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock().await;
            state.load = LoadState::Loading;
            state.error = None;
        }

        let result = self
            .race(self.client.get::<Option<Vec<R>>>(&self.list_path))
            .await;
        if self.lifetime.is_cancelled() {
            return Err(ControllerError::Cancelled);
        }

        let mut state = self.state.lock().await;
        if self.list_epoch.load(Ordering::SeqCst) != epoch {
            debug!("Discarding superseded {} list", R::LABEL);
            return Ok(());
        }

        state.load = LoadState::Ready;
        match result {
            Ok(items) => {
                state.items = items.unwrap_or_default();
                debug!("Loaded {} {}s", state.items.len(), R::LABEL);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load {}s: {}", R::LABEL, e);
                state.error = Some(e.user_message(&format!("Could not load {}s", R::LABEL), true));
                Self::note_session(&mut state, &e);
                Err(e)
            }
        }
    }

    pub async fn open_create(&self) {
        let mut state = self.state.lock().await;
        state.form = FormModal::Creating;
        state.form_error = None;
    }

    pub async fn open_edit(&self, id: &str) {
        let mut state = self.state.lock().await;
        state.form = FormModal::Editing { id: id.to_string() };
        state.form_error = None;
    }

    pub async fn close_form(&self) {
        let mut state = self.state.lock().await;
        state.form = FormModal::Closed;
        state.form_error = None;
    }

    /// Open the edit form and fetch the entity to prefill it
    pub async fn load_for_edit(&self, id: &str) -> ControllerResult<R> {
        self.open_edit(id).await;

        let result = self.race(self.client.get::<R>(&item_path::<R>(id))).await;
        if self.lifetime.is_cancelled() {
            return Err(ControllerError::Cancelled);
        }

        if let Err(e) = &result {
            warn!("Failed to load {} {}: {}", R::LABEL, id, e);
            let mut state = self.state.lock().await;
            state.form_error = Some(e.user_message(&format!("Could not load {}", R::LABEL), true));
            Self::note_session(&mut state, e);
        }
        result
    }

    /// Validate and create an entity from the open creation form
    pub async fn submit_create(&self, draft: R::Draft) -> ControllerResult<()> {
        {
            let mut state = self.state.lock().await;
            if state.form != FormModal::Creating {
                return Err(ControllerError::InvalidState("No creation form is open"));
            }
            if let Err(errors) = R::validate_draft(&draft, &state.items) {
                state.form_error = Some(errors.to_string());
                return Err(errors.into());
            }
            Self::begin(&mut state)?;
        }

        let result = self
            .race(self.client.post::<_, IgnoredAny>(R::COLLECTION, &draft))
            .await;
        self.finish_mutation(result, "create", ErrorSlot::Form).await
    }

    /// Validate and send the update of the entity in the open edit form
    pub async fn submit_edit(&self, patch: R::Patch) -> ControllerResult<()> {
        let id = {
            let mut state = self.state.lock().await;
            let FormModal::Editing { id } = state.form.clone() else {
                return Err(ControllerError::InvalidState("No edit form is open"));
            };
            if let Err(errors) = R::validate_patch(&id, &patch, &state.items) {
                state.form_error = Some(errors.to_string());
                return Err(errors.into());
            }
            Self::begin(&mut state)?;
            id
        };

        let result = self
            .race(
                self.client
                    .patch::<_, IgnoredAny>(&item_path::<R>(&id), &patch),
            )
            .await;
        self.finish_mutation(result, "update", ErrorSlot::Form).await
    }

    pub async fn open_delete_confirm(&self, id: &str) {
        let mut state = self.state.lock().await;
        state.confirm = ConfirmDialog::ConfirmingDelete { id: id.to_string() };
    }

    pub async fn cancel_delete(&self) {
        self.state.lock().await.confirm = ConfirmDialog::Closed;
    }

    /// Delete the entity awaiting confirmation
    ///
    /// On failure the dialog stays open so the user can retry or cancel.
    pub async fn confirm_delete(&self) -> ControllerResult<()> {
        let (id, body) = {
            let mut state = self.state.lock().await;
            let ConfirmDialog::ConfirmingDelete { id } = state.confirm.clone() else {
                return Err(ControllerError::InvalidState("No deletion awaits confirmation"));
            };
            let body = state
                .items
                .iter()
                .find(|item| item.id() == id)
                .and_then(R::delete_body);
            if R::DELETE_BY_BODY && body.is_none() {
                warn!("Cannot delete {} {}: it is not in the loaded list", R::LABEL, id);
                return Err(ControllerError::InvalidState(
                    "The entity to delete is not loaded",
                ));
            }
            Self::begin(&mut state)?;
            (id, body)
        };

        let result = match body {
            Some(body) => {
                self.race(self.client.delete_with_body(R::COLLECTION, &body))
                    .await
            }
            None => self.race(self.client.delete(&item_path::<R>(&id))).await,
        };
        if self.lifetime.is_cancelled() {
            return Err(ControllerError::Cancelled);
        }

        {
            let mut state = self.state.lock().await;
            state.processing = false;
            if let Err(e) = &result {
                warn!("Failed to delete {} {}: {}", R::LABEL, id, e);
                state.error = Some(e.user_message(&format!("Could not delete {}", R::LABEL), false));
                Self::note_session(&mut state, e);
                return result;
            }
            state.confirm = ConfirmDialog::Closed;
            state.error = None;
        }

        info!("Deleted {} {}", R::LABEL, id);
        self.reload().await
    }

    /// Update an entity without going through the edit form
    pub async fn apply_patch(&self, id: &str, patch: R::Patch) -> ControllerResult<()> {
        {
            let mut state = self.state.lock().await;
            if let Err(errors) = R::validate_patch(id, &patch, &state.items) {
                state.error = Some(errors.to_string());
                return Err(errors.into());
            }
            Self::begin(&mut state)?;
        }

        let result = self
            .race(self.client.patch::<_, IgnoredAny>(&item_path::<R>(id), &patch))
            .await;
        self.finish_mutation(result, "update", ErrorSlot::Screen)
            .await
    }

    /// Cancel in-flight requests; later responses are ignored
    pub fn teardown(&self) {
        if !self.lifetime.is_cancelled() {
            debug!("Tearing down {} controller", R::LABEL);
            self.lifetime.cancel();
        }
    }

    /// Take the processing flag
    fn begin(state: &mut ScreenState<R>) -> ControllerResult<()> {
        if state.processing {
            debug!("Rejecting {} submission while another is in flight", R::LABEL);
            return Err(ControllerError::Busy);
        }
        state.processing = true;
        state.form_error = None;
        Ok(())
    }

    async fn finish_mutation(
        &self,
        result: ControllerResult<IgnoredAny>,
        verb: &str,
        slot: ErrorSlot,
    ) -> ControllerResult<()> {
        if self.lifetime.is_cancelled() {
            return Err(ControllerError::Cancelled);
        }

        {
            let mut state = self.state.lock().await;
            state.processing = false;
            if let Err(e) = &result {
                warn!("Failed to {} {}: {}", verb, R::LABEL, e);
                let message = e.user_message(&format!("Could not {} {}", verb, R::LABEL), true);
                match slot {
                    ErrorSlot::Form => state.form_error = Some(message),
                    ErrorSlot::Screen => state.error = Some(message),
                }
                Self::note_session(&mut state, e);
                return result.map(|_| ());
            }
            if let ErrorSlot::Form = slot {
                state.form = FormModal::Closed;
                state.form_error = None;
            }
        }

        info!("{} request for {} succeeded", verb, R::LABEL);
        self.reload().await
    }

    /// Reload after a successful mutation; a failed reload only shows on screen
    async fn reload(&self) -> ControllerResult<()> {
        match self.list().await {
            Err(ControllerError::Cancelled) => Err(ControllerError::Cancelled),
            _ => Ok(()),
        }
    }

    async fn race<T>(&self, request: impl Future<Output = ClientResult<T>>) -> ControllerResult<T> {
        tokio::select! {
            _ = self.lifetime.cancelled() => Err(ControllerError::Cancelled),
            result = request => result.map_err(ControllerError::from),
        }
    }

    fn note_session(state: &mut ScreenState<R>, error: &ControllerError) {
        if let ControllerError::Client(e) = error {
            if e.is_unauthorized() {
                state.session = SessionState::RedirectToLogin;
            }
        }
    }
}

impl<R: Resource> Drop for ResourceController<R> {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Club, ClubDraft};
    use common::MemoryTokenStore;
    use std::sync::Arc;

    fn controller() -> ResourceController<Club> {
        // Nothing listens here; the tests below never reach the network.
        let client = ApiClient::new("http://127.0.0.1:9", Arc::new(MemoryTokenStore::new()));
        ResourceController::new(client)
    }

    #[tokio::test]
    async fn test_initial_state() {
        let state = controller().snapshot().await;
        assert_eq!(state.load, LoadState::Loading);
        assert_eq!(state.form, FormModal::Closed);
        assert_eq!(state.confirm, ConfirmDialog::Closed);
        assert_eq!(state.session, SessionState::Active);
        assert!(!state.processing);
    }

    #[tokio::test]
    async fn test_dialog_transitions() {
        let controller = controller();

        controller.open_create().await;
        assert_eq!(controller.snapshot().await.form, FormModal::Creating);

        controller.open_edit("c1").await;
        assert_eq!(
            controller.snapshot().await.form,
            FormModal::Editing {
                id: "c1".to_string()
            }
        );

        controller.close_form().await;
        controller.open_delete_confirm("c1").await;
        let state = controller.snapshot().await;
        assert_eq!(state.form, FormModal::Closed);
        assert_eq!(
            state.confirm,
            ConfirmDialog::ConfirmingDelete {
                id: "c1".to_string()
            }
        );

        controller.cancel_delete().await;
        assert_eq!(controller.snapshot().await.confirm, ConfirmDialog::Closed);
    }

    #[tokio::test]
    async fn test_invalid_draft_sets_form_error() {
        let controller = controller();
        controller.open_create().await;

        let result = controller.submit_create(ClubDraft::named(" ")).await;
        assert!(matches!(result, Err(ControllerError::Validation(_))));

        let state = controller.snapshot().await;
        assert_eq!(state.form_error.as_deref(), Some("Name is required"));
        assert!(!state.processing);
    }

    #[tokio::test]
    async fn test_submit_without_open_form() {
        let controller = controller();
        let result = controller.submit_create(ClubDraft::named("Rotary")).await;
        assert!(matches!(result, Err(ControllerError::InvalidState(_))));

        let result = controller.submit_create(ClubDraft::named(" ")).await;
        assert!(matches!(result, Err(ControllerError::InvalidState(_))));
        assert_eq!(controller.snapshot().await.form_error, None);

        let result = controller.confirm_delete().await;
        assert!(matches!(result, Err(ControllerError::InvalidState(_))));
        assert!(!controller.snapshot().await.processing);
    }

    #[tokio::test]
    async fn test_teardown_cancels_requests() {
        let controller = controller();
        controller.teardown();
        assert!(matches!(
            controller.list().await,
            Err(ControllerError::Cancelled)
        ));
        assert_eq!(controller.snapshot().await.load, LoadState::Loading);
    }
}
