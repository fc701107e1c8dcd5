//! Synthetic identifier generation.

use crate::error::{SyncError, SyncResult};

pub trait IdGenerator {
    fn generate(&self) -> SyncResult<String>;

    /// A generated id that is safe to key records by. Blank ids and ids
    /// containing whitespace or path separators fail with
    /// [`SyncError::Identity`].
    fn next_id(&self) -> SyncResult<String> {
        let id = self.generate()?;
        let usable = !id.is_empty()
            && !id
                .chars()
                .any(|c| c.is_whitespace() || c == '/' || c == '\\');
        if !usable {
            return Err(SyncError::Identity(format!("unusable identifier '{}'", id)));
        }
        Ok(id)
    }
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> SyncResult<String> {
        Ok(uuid::Uuid::new_v4().to_string())
    }
}
