//! Error types for Mailroom.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Kind of record an id failed to resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Message,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Message => write!(f, "message"),
        }
    }
}

/// Storage errors. Every failure happens before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: Entity, id: String },
}

impl StoreError {
    pub(crate) fn user(id: impl ToString) -> Self {
        Self::NotFound {
            entity: Entity::User,
            id: id.to_string(),
        }
    }

    pub(crate) fn message(id: impl ToString) -> Self {
        Self::NotFound {
            entity: Entity::Message,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Which kind of record was missing.
    pub fn entity(&self) -> Entity {
        match self {
            Self::NotFound { entity, .. } => *entity,
        }
    }
}

/// Result type alias for Mailroom.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = StoreError::message("abc");
        assert_eq!(err.to_string(), "Entity not found: message with id abc");
        assert_eq!(err.entity(), Entity::Message);
        assert!(err.is_not_found());
    }

    #[test]
    fn store_error_converts_into_top_level() {
        let err: Error = StoreError::user("u1").into();
        assert!(matches!(err, Error::Store(StoreError::NotFound { entity: Entity::User, .. })));
        assert_eq!(err.to_string(), "Store error: Entity not found: user with id u1");
    }
}
