//! Authentication session state.

use serde::{Deserialize, Serialize};

/// The authenticated-or-not state of the current user.
///
/// A session is created by a successful sign-in and destroyed by explicit
/// sign-out or provider-forced invalidation. There is no intermediate
/// state: observers see either variant, never "signing in".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    /// No user is signed in.
    #[default]
    Unauthenticated,
    /// A user is signed in.
    Authenticated {
        /// Provider-assigned stable identifier for the user.
        user_id: String,
        /// The email address the user signed in with.
        email: String,
    },
}

impl Session {
    /// Returns true when a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// The signed-in user's identifier, if any.
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Authenticated { user_id, .. } => Some(user_id),
            Self::Unauthenticated => None,
        }
    }

    /// The signed-in user's email, if any.
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Authenticated { email, .. } => Some(email),
            Self::Unauthenticated => None,
        }
    }
}
