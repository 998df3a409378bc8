//! Avatar Labels
//!
//! Initials and background color for users without a profile photo.

use serde::{Deserialize, Serialize};

/// Initials shown for an empty name.
pub const DEFAULT_INITIALS: &str = "?";

/// Background color used for an empty name.
pub const DEFAULT_COLOR: &str = "#bdbdbd";

/// Presentation descriptor for a letter avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarLabel {
    /// One or two uppercase initials.
    pub initials: String,
    /// Background color as `#rrggbb`.
    pub color: String,
}

impl Default for AvatarLabel {
    fn default() -> Self {
        Self {
            initials: DEFAULT_INITIALS.to_string(),
            color: DEFAULT_COLOR.to_string(),
        }
    }
}

/// Derive the avatar label for a display name.
///
/// Deterministic: the same name always yields the same initials and color.
pub fn string_avatar(name: &str) -> AvatarLabel {
    let name = name.trim();
    if name.is_empty() {
        return AvatarLabel::default();
    }

    let initials = name
        .split_whitespace()
        .take(2)
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect();

    AvatarLabel {
        initials,
        color: string_to_color(name),
    }
}

/// Rolling 32-bit hash over UTF-16 code units, rendered from its low three bytes.
fn string_to_color(value: &str) -> String {
    let hash = value.encode_utf16().fold(0i32, |hash, unit| {
        i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    });

    let mut color = String::with_capacity(7);
    color.push('#');
    for i in 0..3 {
        let byte = (hash >> (i * 8)) & 0xff;
        color.push_str(&format!("{byte:02x}"));
    }
    color
}
