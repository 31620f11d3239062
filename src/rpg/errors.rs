use thiserror::Error;

use crate::storage::StoreError;

/// Every way an action can be refused or fail.
///
/// All variants except [`GameError::StoreUnavailable`] are eligibility or
/// argument failures detected before any state is mutated, so the stored
/// record is left untouched.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("player has not started; use `start` first")]
    NotStarted,

    #[error("player has already started")]
    AlreadyStarted,

    #[error("{action} is on cooldown for another {remaining_secs}s")]
    OnCooldown { action: String, remaining_secs: u64 },

    #[error("insufficient funds: need {needed} coins, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("requires level {required} (current {current})")]
    InsufficientLevel { required: u32, current: u32 },

    #[error("requires at least {required} hp (current {current})")]
    InsufficientHealth { required: u32, current: u32 },

    #[error("inventory full ({capacity} items)")]
    InventoryFull { capacity: usize },

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Persistence failed or timed out.
    ///
    /// Nothing was saved for this action, except with
    /// [`StoreError::WriteUnconfirmed`]: there the write did not confirm
    /// within the store timeout and may still land. Until it settles, the
    /// player's lock stays held and later actions for that player fail with
    /// [`StoreError::Timeout`].
    #[error("player store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl GameError {
    /// Whether the caller may reasonably repeat the same request.
    /// An unconfirmed write is not retryable: repeating it could apply it twice.
    pub fn is_retryable(&self) -> bool {
        match self {
            GameError::StoreUnavailable(StoreError::WriteUnconfirmed(_)) => false,
            GameError::StoreUnavailable(_) => true,
            _ => false,
        }
    }

    /// Whether the action's write may have been applied despite the error.
    pub fn outcome_unknown(&self) -> bool {
        matches!(self, GameError::StoreUnavailable(StoreError::WriteUnconfirmed(_)))
    }

    /// Short machine-friendly code for adapters and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::NotStarted => "not_started",
            GameError::AlreadyStarted => "already_started",
            GameError::OnCooldown { .. } => "on_cooldown",
            GameError::InsufficientFunds { .. } => "insufficient_funds",
            GameError::InsufficientLevel { .. } => "insufficient_level",
            GameError::InsufficientHealth { .. } => "insufficient_health",
            GameError::InventoryFull { .. } => "inventory_full",
            GameError::ItemNotFound(_) => "item_not_found",
            GameError::InvalidArgument(_) => "invalid_argument",
            GameError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}
