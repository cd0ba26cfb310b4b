//! Ordered roster projection.

use std::sync::Arc;

use crate::document::ChangeBatch;
use crate::player::Player;

/// The locally held, ordered view of every player in the collection.
///
/// A roster is an immutable snapshot: it is derived in full from one change
/// batch and replaced atomically when the next batch arrives. Clones share
/// the underlying slice, so handing one to an observer is cheap and the
/// observer can never mutate it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Roster {
    players: Arc<[Player]>,
}

impl Roster {
    /// Derives the projection from a change batch.
    ///
    /// Players sort ascending by jersey number; ties keep the order the
    /// documents appeared in the batch (stable sort), so repeated
    /// derivations of the same batch always agree.
    pub fn from_batch(batch: &ChangeBatch) -> Self {
        let mut players: Vec<Player> = batch.documents.iter().map(Player::from_document).collect();
        players.sort_by_key(|p| p.jersey_number);
        Self {
            players: players.into(),
        }
    }

    /// Number of players in the projection.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Returns true when the projection holds no players.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// The players in projection order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Iterates the players in projection order.
    pub fn iter(&self) -> std::slice::Iter<'_, Player> {
        self.players.iter()
    }

    /// Looks up a player by store-assigned id.
    pub fn by_id(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a Player;
    type IntoIter = std::slice::Iter<'a, Player>;

    fn into_iter(self) -> Self::IntoIter {
        self.players.iter()
    }
}
