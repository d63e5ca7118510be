//! Database row types — these map directly to SQLite rows.
//! Distinct from the vows-types view models to keep the DB layer independent.

use chrono::NaiveDate;
use vows_types::models::{CommitmentId, UserId, WeddingId};

pub struct UserRow {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

pub struct WeddingRow {
    pub id: WeddingId,
    pub nearlywed_one: String,
    pub nearlywed_two: String,
    pub date: NaiveDate,
    pub address: String,
    pub creator_id: UserId,
    /// Number of commitments, filled in by the listing query only.
    pub guest_count: usize,
}

pub struct CommitmentRow {
    pub id: CommitmentId,
    pub user_id: UserId,
    pub wedding_id: WeddingId,
}

/// A commitment joined with the guest's name.
pub struct GuestRow {
    pub commitment_id: CommitmentId,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
}
