//! Client library for the club administration backend
//!
//! Each administration screen is a [`ResourceController`] over one
//! [`Resource`]: users, roles, user types, clubs and user-club
//! associations. [`AuthService`] covers login, registration and the
//! current session.

pub mod auth;
pub mod client;
pub mod controller;
pub mod error;
pub mod memberships;
pub mod models;
pub mod resource;
pub mod validation;

pub use auth::AuthService;
pub use client::ApiClient;
pub use controller::{
    ConfirmDialog, FormModal, LoadState, ResourceController, ScreenState, SessionState,
};
pub use error::{AuthError, ClientError, ControllerError};
pub use memberships::{Profile, load_memberships, load_profile, user_clubs_controller};
pub use resource::Resource;
pub use validation::ValidationErrors;
