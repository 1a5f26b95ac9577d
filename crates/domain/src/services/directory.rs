//! Match/pet directory contract.
//!
//! Match and pet ownership records live in an adjacent service; the engine
//! only needs to ask whether a match is active and which user owns a pet
//! within that match.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

/// Read-only view onto the match/pet directory.
#[async_trait::async_trait]
pub trait MatchDirectory: Send + Sync {
    /// Whether the match exists and is still active.
    async fn is_match_active(&self, match_id: Uuid) -> bool;

    /// The user owning `pet_id` within `match_id`, or `None` when the pet is
    /// not part of that match.
    async fn pet_owner_in_match(&self, match_id: Uuid, pet_id: Uuid) -> Option<Uuid>;
}

/// In-memory directory for development and testing.
#[derive(Debug, Default)]
pub struct StaticMatchDirectory {
    matches: RwLock<HashMap<Uuid, MatchRecord>>,
}

#[derive(Debug, Clone)]
struct MatchRecord {
    active: bool,
    /// pet id -> owning user id
    pets: HashMap<Uuid, Uuid>,
}

impl StaticMatchDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a match between two (user, pet) pairs.
    pub fn add_match(&self, match_id: Uuid, side_a: (Uuid, Uuid), side_b: (Uuid, Uuid)) {
        let (user_a, pet_a) = side_a;
        let (user_b, pet_b) = side_b;
        let record = MatchRecord {
            active: true,
            pets: HashMap::from([(pet_a, user_a), (pet_b, user_b)]),
        };
        self.matches
            .write()
            .expect("directory lock poisoned")
            .insert(match_id, record);
    }

    /// Marks a match inactive (unmatched by either party).
    pub fn deactivate(&self, match_id: Uuid) {
        if let Some(record) = self
            .matches
            .write()
            .expect("directory lock poisoned")
            .get_mut(&match_id)
        {
            record.active = false;
        }
    }
}

#[async_trait::async_trait]
impl MatchDirectory for StaticMatchDirectory {
    async fn is_match_active(&self, match_id: Uuid) -> bool {
        self.matches
            .read()
            .expect("directory lock poisoned")
            .get(&match_id)
            .map(|m| m.active)
            .unwrap_or(false)
    }

    async fn pet_owner_in_match(&self, match_id: Uuid, pet_id: Uuid) -> Option<Uuid> {
        self.matches
            .read()
            .expect("directory lock poisoned")
            .get(&match_id)
            .and_then(|m| m.pets.get(&pet_id).copied())
    }
}
