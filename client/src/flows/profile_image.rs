//! Profile image update.
//!
//! Uploads a picked image, resolves its download URL and binds it to the
//! signed-in account's profile. Steps run strictly in sequence. Failures are
//! logged, published to the observable state and returned; they never reach
//! the caller as a panic.

use std::sync::Arc;

use bytes::Bytes;
use natter_common::{Account, ProfileUpdate};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info};

use crate::config::{AvatarKeyStrategy, AvatarSettings};
use crate::services::{IdentityService, ServiceError, StorageService};
use crate::session::Session;
use crate::util::format_file_size;

/// MIME types the file picker accepts.
pub const ACCEPTED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/jpg"];

/// A file handed over by the file picker.
#[derive(Clone)]
pub struct UploadedImage {
    /// Original file name, if the picker reported one.
    pub file_name: Option<String>,
    /// Declared MIME type.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

impl UploadedImage {
    pub fn new(content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: None,
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    #[must_use]
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }
}

impl std::fmt::Debug for UploadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedImage")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Observable upload state rendered by the profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileImageState {
    /// An upload is in flight.
    pub busy: bool,
    /// Description of the last failure, cleared when a new upload starts.
    pub last_error: Option<String>,
}

/// Profile image update failures.
#[derive(Debug, Error)]
pub enum ImageUpdateError {
    #[error("No file selected")]
    NoFileSelected,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image too large ({size}). Maximum size is {max}")]
    TooLarge { size: String, max: String },

    #[error("File content is not a PNG or JPEG image")]
    ContentMismatch,

    #[error("Account has no display name to store the image under")]
    MissingDisplayName,

    #[error("Upload failed: {0}")]
    Upload(#[source] ServiceError),

    #[error("Could not resolve download URL: {0}")]
    DownloadUrl(#[source] ServiceError),

    #[error("Profile update failed: {0}")]
    ProfileUpdate(#[source] ServiceError),
}

impl ImageUpdateError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Upload(e) | Self::DownloadUrl(e) | Self::ProfileUpdate(e) => {
                e.user_message().to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Profile page image controller.
pub struct ProfileImageFlow {
    session: Session,
    identity: Arc<dyn IdentityService>,
    storage: Arc<dyn StorageService>,
    settings: AvatarSettings,
    state: watch::Sender<ProfileImageState>,
}

impl ProfileImageFlow {
    pub fn new(
        session: Session,
        identity: Arc<dyn IdentityService>,
        storage: Arc<dyn StorageService>,
        settings: AvatarSettings,
    ) -> Self {
        Self {
            session,
            identity,
            storage,
            settings,
            state: watch::Sender::new(ProfileImageState::default()),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> ProfileImageState {
        self.state.borrow().clone()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<ProfileImageState> {
        self.state.subscribe()
    }

    /// Handle the picker's selection; only the first file is used.
    pub async fn on_files_selected(
        &self,
        files: impl IntoIterator<Item = UploadedImage>,
    ) -> Result<Account, ImageUpdateError> {
        match files.into_iter().next() {
            Some(file) => self.on_file_selected(file).await,
            None => Err(ImageUpdateError::NoFileSelected),
        }
    }

    /// Upload `file` and make it the profile photo.
    #[tracing::instrument(skip_all, fields(content_type = %file.content_type, size = file.data.len()))]
    pub async fn on_file_selected(&self, file: UploadedImage) -> Result<Account, ImageUpdateError> {
        self.state.send_replace(ProfileImageState {
            busy: true,
            last_error: None,
        });

        let result = self.update(file).await;

        match &result {
            Ok(account) => {
                info!(account_id = %account.id, "Profile image updated");
                self.state.send_replace(ProfileImageState::default());
            }
            Err(e) => {
                error!("Error uploading image: {}", e);
                self.state.send_replace(ProfileImageState {
                    busy: false,
                    last_error: Some(e.user_message()),
                });
            }
        }

        result
    }

    async fn update(&self, file: UploadedImage) -> Result<Account, ImageUpdateError> {
        let account = self
            .session
            .current_account()
            .await
            .ok_or(ImageUpdateError::NotSignedIn)?;

        let content_type = self.check_file(&file)?;
        let key = self.storage_key(&account)?;

        self.storage
            .upload(&key, file.data, &content_type)
            .await
            .map_err(ImageUpdateError::Upload)?;

        let url = self
            .storage
            .download_url(&key)
            .await
            .map_err(ImageUpdateError::DownloadUrl)?;

        // Display name is re-written unchanged alongside the photo.
        let update = ProfileUpdate {
            display_name: account.display_name.clone(),
            photo_url: Some(url),
        };
        self.identity
            .update_profile(&account, &update)
            .await
            .map_err(ImageUpdateError::ProfileUpdate)?;

        Ok(self.session.apply_update(&update).await.unwrap_or_else(|| {
            let mut account = account;
            account.apply(&update);
            account
        }))
    }

    /// Check the file and return its normalized content type.
    fn check_file(&self, file: &UploadedImage) -> Result<String, ImageUpdateError> {
        let declared = file.content_type.trim().to_ascii_lowercase();
        if !ACCEPTED_TYPES.contains(&declared.as_str()) {
            return Err(ImageUpdateError::UnsupportedType(file.content_type.clone()));
        }

        if file.data.len() > self.settings.max_size {
            return Err(ImageUpdateError::TooLarge {
                size: format_file_size(file.data.len()),
                max: format_file_size(self.settings.max_size),
            });
        }

        // Don't trust the declared type; check magic bytes.
        match image::guess_format(&file.data) {
            Ok(image::ImageFormat::Png | image::ImageFormat::Jpeg) => Ok(declared),
            _ => Err(ImageUpdateError::ContentMismatch),
        }
    }

    fn storage_key(&self, account: &Account) -> Result<String, ImageUpdateError> {
        match self.settings.key_strategy {
            AvatarKeyStrategy::AccountId => Ok(account.id.to_string()),
            AvatarKeyStrategy::DisplayName => {
                let name = account.name();
                if name.trim().is_empty() {
                    return Err(ImageUpdateError::MissingDisplayName);
                }
                Ok(name.to_string())
            }
        }
    }
}
