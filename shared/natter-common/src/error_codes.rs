//! Backend Error Messages
//!
//! Maps error identifiers reported by the identity, storage and document
//! services to text that can be shown to the user.

/// Message shown for codes with no dedicated text.
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

/// Translate a backend error code into a user-facing message.
///
/// Total: unknown codes fall back to [`FALLBACK_MESSAGE`].
pub fn message_for_code(code: &str) -> &'static str {
    match code {
        // Identity
        "auth/email-already-in-use" => "An account with this email already exists.",
        "auth/invalid-email" => "The email address is not valid.",
        "auth/weak-password" => "The password is too weak. Please choose a stronger one.",
        "auth/operation-not-allowed" => "Email sign-up is currently disabled.",
        "auth/network-request-failed" => {
            "Could not reach the server. Check your connection and try again."
        }
        "auth/too-many-requests" => "Too many attempts. Please wait a moment and try again.",
        "auth/user-disabled" => "This account has been disabled.",
        "auth/user-token-expired" => "Your session has expired. Please log in again.",
        "auth/internal-error" => "The server ran into a problem. Please try again.",

        // Storage
        "storage/unauthorized" => "You are not allowed to upload this file.",
        "storage/object-not-found" => "The uploaded file could not be found.",
        "storage/quota-exceeded" => "Storage quota exceeded. Please try again later.",

        // Documents
        "permission-denied" => "You do not have permission to save this profile.",
        "unavailable" => "The service is temporarily unavailable. Please try again.",

        _ => FALLBACK_MESSAGE,
    }
}
