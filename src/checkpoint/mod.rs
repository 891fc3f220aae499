//! Checkpoints of a manager's current state.
//!
//! A checkpoint captures what is needed to rebuild a manager elsewhere: the
//! current path and the host context. Definitions, callbacks and handlers
//! are code and are never serialized; restoring pairs a checkpoint with a
//! definition built by the receiving process.

use crate::adapters::StateStore;
use crate::core::{Definition, StateError};
use crate::manager::{Context, StateManager, TransitionHooks};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a manager.
///
/// # Example
///
/// ```rust
/// use statetree::builder::StateBuilder;
/// use statetree::checkpoint::Checkpoint;
/// use statetree::manager::StateManager;
///
/// let definition = StateBuilder::<Option<String>>::new()
///     .leaf("open")
///     .leaf("closed")
///     .build()?;
///
/// let mut issue = StateManager::new(definition.clone(), None)?;
/// issue.transition_to("closed")?;
/// issue.context_mut().insert("closed_by".to_string(), "ops".to_string());
///
/// let json = issue.checkpoint().to_json()?;
/// let restored = Checkpoint::from_json(&json)?.restore(definition, None, ())?;
///
/// assert_eq!(restored.current_path().as_deref(), Some("closed"));
/// assert_eq!(restored.context(), issue.context());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Current path, `None` if the manager had no current state
    pub path: Option<String>,

    pub context: Context,
}

impl Checkpoint {
    pub fn capture(path: Option<String>, context: &Context) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            path,
            context: context.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self).map_err(|e| CheckpointError::Encode {
            format: "JSON",
            message: e.to_string(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json).map_err(|e| CheckpointError::Decode {
            format: "JSON",
            message: e.to_string(),
        })?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::Encode {
            format: "binary",
            message: e.to_string(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes).map_err(|e| CheckpointError::Decode {
            format: "binary",
            message: e.to_string(),
        })?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version == CHECKPOINT_VERSION {
            Ok(())
        } else {
            Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            })
        }
    }

    /// Rebuild a manager in the checkpointed state.
    ///
    /// The path is written to `resource` before the manager is created, so
    /// no transition runs. A checkpoint without a path yields a manager in
    /// its initial state.
    pub fn restore<R, H>(
        &self,
        definition: Arc<Definition<R>>,
        mut resource: R,
        hooks: H,
    ) -> Result<StateManager<R, H>, CheckpointError>
    where
        R: StateStore,
        H: TransitionHooks<R>,
    {
        self.check_version()?;

        if let Some(path) = &self.path {
            match definition.find(path) {
                Some(spec) if !path.is_empty() && spec.is_leaf() => resource.write_state(path),
                Some(_) => return Err(StateError::InvalidTransition { path: path.clone() }.into()),
                None => return Err(StateError::StateNotFound { path: path.clone() }.into()),
            }
        }

        let mut manager = StateManager::with_hooks(definition, resource, hooks)?;
        *manager.context_mut() = self.context.clone();
        Ok(manager)
    }
}
