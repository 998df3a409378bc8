//! Page controllers.

pub mod profile_image;
pub mod sign_up;

pub use profile_image::{
    ImageUpdateError, ProfileImageFlow, ProfileImageState, UploadedImage, ACCEPTED_TYPES,
};
pub use sign_up::{RegistrationError, RegistrationStep, SignUpFlow, SignUpPhase, SignUpState};
