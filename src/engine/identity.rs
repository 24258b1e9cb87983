//! Maps opaque external identities to stored user rows.
//!
//! Two first logins for the same identity can race: both miss the read,
//! both attempt the insert, one loses on the unique index. The contract is
//! insert-then-recover-by-read: the loser discards its insert, re-reads the
//! row the winner created, and returns that. The conflict is never surfaced.

use crate::error::{EngineError, StoreError};
use crate::models::User;
use crate::store::Store;
use std::sync::Arc;
use tracing::{debug, info};

pub struct IdentityResolver {
    store: Arc<Store>,
}

impl IdentityResolver {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Get-or-create by external id. Both requests in a creation race get
    /// the same row back.
    pub fn get_or_create(
        &self,
        external_id: &str,
        email: &str,
        display_name: &str,
    ) -> Result<User, EngineError> {
        if let Some(user) = self.store.find_user_by_external_id(external_id) {
            return Ok(user);
        }

        match self.store.insert_user(external_id, email, display_name) {
            Ok(user) => {
                info!(external_id, user_id = user.id, "user created");
                Ok(user)
            }
            Err(StoreError::UniqueViolation(_)) => {
                // A concurrent request created the row between our read and
                // write; theirs wins
                debug!(external_id, "lost user-creation race, re-reading");
                self.store
                    .find_user_by_external_id(external_id)
                    .ok_or_else(|| {
                        EngineError::Validation(format!(
                            "user {} missing after conflicting insert",
                            external_id
                        ))
                    })
            }
            Err(err) => Err(err.into()),
        }
    }
}
