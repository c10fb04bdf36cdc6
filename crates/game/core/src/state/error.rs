//! World bookkeeping errors.

use crate::error::{CombatError, ErrorSeverity};
use crate::state::{EntityId, RoomId};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error("room '{0}' does not exist")]
    UnknownRoom(RoomId),

    #[error("no combatant {0}")]
    UnknownEntity(EntityId),

    #[error("entity id space exhausted")]
    EntityIdOverflow,
}

impl CombatError for WorldError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownRoom(_) | Self::UnknownEntity(_) => ErrorSeverity::Validation,
            Self::EntityIdOverflow => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownRoom(_) => "world.unknown_room",
            Self::UnknownEntity(_) => "world.unknown_entity",
            Self::EntityIdOverflow => "world.id_overflow",
        }
    }
}
