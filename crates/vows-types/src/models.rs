use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Store ids start at 1; zero means "never assigned".
            pub fn is_unset(self) -> bool {
                self.0 == 0
            }

            /// Reads an id from a path segment or form field. Anything that is
            /// not an `i64` becomes the unset id, which matches no row.
            pub fn from_param(raw: &str) -> Self {
                raw.trim().parse().map(Self).unwrap_or_default()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

row_id!(
    /// Primary key of a registered user.
    UserId
);
row_id!(
    /// Primary key of a wedding.
    WeddingId
);
row_id!(
    /// Primary key of an RSVP.
    CommitmentId
);

/// A user that passed registration checks. `password_hash` is already an
/// Argon2 PHC string.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

/// A wedding ready for insertion. `creator_id` always comes from the session.
#[derive(Debug, Clone)]
pub struct NewWedding {
    pub nearlywed_one: String,
    pub nearlywed_two: String,
    pub date: NaiveDate,
    pub address: String,
    pub creator_id: UserId,
}

/// An RSVP before insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCommitment {
    pub user_id: UserId,
    pub wedding_id: WeddingId,
}
