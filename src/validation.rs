//! Player id and argument validation.
//!
//! Player ids arrive from the chat platform and end up inside store keys
//! (`players:<id>`, `snapshots:<id>:<nanos>`), so the allowed alphabet is kept
//! narrow and the key separator is never accepted.

use crate::rpg::errors::GameError;

pub const MAX_PLAYER_ID_LEN: usize = 64;
pub const MAX_ITEM_NAME_LEN: usize = 64;

/// Player id validation errors with helpful messages
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlayerIdError {
    #[error("player id is empty")]
    Empty,

    #[error("player id is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("player id contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },
}

impl From<PlayerIdError> for GameError {
    fn from(err: PlayerIdError) -> Self {
        GameError::InvalidArgument(err.to_string())
    }
}

fn allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '@')
}

/// Validate a platform-supplied player id. Ids are case-sensitive and stored as given.
pub fn validate_player_id(player_id: &str) -> Result<&str, PlayerIdError> {
    if player_id.is_empty() {
        return Err(PlayerIdError::Empty);
    }
    if player_id.chars().count() > MAX_PLAYER_ID_LEN {
        return Err(PlayerIdError::TooLong {
            max: MAX_PLAYER_ID_LEN,
        });
    }
    let mut bad: Vec<char> = player_id.chars().filter(|c| !allowed(*c)).collect();
    if !bad.is_empty() {
        bad.dedup();
        let chars = bad
            .iter()
            .map(|c| if c.is_control() { format!("\\x{:02X}", *c as u32) } else { format!("'{}'", c) })
            .collect::<Vec<_>>()
            .join(", ");
        return Err(PlayerIdError::InvalidCharacters { chars });
    }
    Ok(player_id)
}

/// Trim and length-check a free-text item name argument.
pub fn normalize_item_name(raw: &str) -> Result<String, GameError> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return Err(GameError::InvalidArgument("item name is required".to_string()));
    }
    if name.chars().count() > MAX_ITEM_NAME_LEN {
        return Err(GameError::InvalidArgument(format!(
            "item name is too long (maximum {} characters)",
            MAX_ITEM_NAME_LEN
        )));
    }
    Ok(name)
}
