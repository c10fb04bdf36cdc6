//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination and from the combat core so
//! clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use mud_core::{
    CastError, CombatError, DamageError, EffectError, ErrorSeverity, HealError,
    TickProcessingError, WorldError,
};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("tick engine is not running")]
    NotRunning,

    #[error("tick engine is already running")]
    AlreadyRunning,

    #[error("world was lost when the worker failed; rebuild the engine")]
    WorldLost,

    #[error("combat worker command channel closed")]
    CommandChannelClosed,

    #[error("combat worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("combat worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Damage(#[from] DamageError),

    #[error(transparent)]
    Heal(#[from] HealError),

    #[error(transparent)]
    Cast(#[from] CastError),

    #[error(transparent)]
    World(#[from] WorldError),

    #[error(transparent)]
    Tick(#[from] TickProcessingError),
}

impl RuntimeError {
    /// Severity of the underlying failure.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Effect(err) => err.severity(),
            Self::Damage(err) => err.severity(),
            Self::Heal(err) => err.severity(),
            Self::Cast(err) => err.severity(),
            Self::World(err) => err.severity(),
            Self::Tick(err) => err.severity(),
            Self::InvalidConfig { .. } => ErrorSeverity::Validation,
            Self::NotRunning | Self::AlreadyRunning => ErrorSeverity::Recoverable,
            Self::WorldLost => ErrorSeverity::Fatal,
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) | Self::WorkerJoin(_) => {
                ErrorSeverity::Internal
            }
        }
    }
}
