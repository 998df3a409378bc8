//! Natter Client Library
//!
//! Sign-up and profile flows for the Natter chat application. The flows
//! orchestrate a hosted identity service, an object store and a document
//! database; page rendering is left to the embedding UI.

mod app;
pub mod config;
pub mod flows;
pub mod services;
pub mod session;
pub mod telemetry;
pub mod util;

pub use app::NatterClient;
pub use config::{AvatarKeyStrategy, AvatarSettings, ClientConfig, LogFormat};
pub use flows::{
    ImageUpdateError, ProfileImageFlow, ProfileImageState, RegistrationError, RegistrationStep,
    SignUpFlow, SignUpPhase, SignUpState, UploadedImage,
};
pub use services::{DocumentStore, IdentityService, ServiceError, ServiceResult, StorageService};
pub use session::{ProfileHeader, Session};
