//! Creation preconditions against the match/pet directory.

use std::sync::Arc;

use uuid::Uuid;

use super::directory::MatchDirectory;

/// The two user ids resolved while validating a creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchParties {
    pub inviter_user_id: Uuid,
    pub invitee_user_id: Uuid,
}

/// Why the creation preconditions failed, as a caller-presentable reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct PreconditionFailed(pub String);

/// Validates match/pet relationships before any appointment state exists.
#[derive(Clone)]
pub struct PreconditionValidator {
    directory: Arc<dyn MatchDirectory>,
}

impl PreconditionValidator {
    pub fn new(directory: Arc<dyn MatchDirectory>) -> Self {
        Self { directory }
    }

    /// Single pass/fail check: the match is active, the inviter pet belongs
    /// to the requesting user, and the invitee pet belongs to the other
    /// party. Returns the resolved participant user ids on success.
    pub async fn validate(
        &self,
        match_id: Uuid,
        inviter_user_id: Uuid,
        inviter_pet_id: Uuid,
        invitee_pet_id: Uuid,
    ) -> Result<MatchParties, PreconditionFailed> {
        if !self.directory.is_match_active(match_id).await {
            return Err(PreconditionFailed(
                "match does not exist or is no longer active".into(),
            ));
        }

        match self
            .directory
            .pet_owner_in_match(match_id, inviter_pet_id)
            .await
        {
            Some(owner) if owner == inviter_user_id => {}
            Some(_) => {
                return Err(PreconditionFailed(
                    "inviter pet does not belong to the requesting user".into(),
                ))
            }
            None => {
                return Err(PreconditionFailed(
                    "inviter pet is not part of this match".into(),
                ))
            }
        }

        let invitee_user_id = match self
            .directory
            .pet_owner_in_match(match_id, invitee_pet_id)
            .await
        {
            Some(owner) if owner != inviter_user_id => owner,
            Some(_) => {
                return Err(PreconditionFailed(
                    "invitee pet belongs to the requesting user".into(),
                ))
            }
            None => {
                return Err(PreconditionFailed(
                    "invitee pet is not part of this match".into(),
                ))
            }
        };

        Ok(MatchParties {
            inviter_user_id,
            invitee_user_id,
        })
    }
}
