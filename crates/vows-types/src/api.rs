use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{CommitmentId, UserId, WeddingId};

// -- Auth --

/// Registration form. Missing fields deserialize as empty strings so the
/// validators can report them per field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Values echoed back into the landing page after a failed submit.
/// Passwords are never echoed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterValues {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&RegisterForm> for RegisterValues {
    fn from(form: &RegisterForm) -> Self {
        Self {
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            email: form.email.clone(),
        }
    }
}

// -- Weddings --

/// Wedding creation form. `date` is kept as the raw input so an unparseable
/// value can be reported and echoed back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeddingForm {
    pub nearlywed_one: String,
    pub nearlywed_two: String,
    pub date: String,
    pub address: String,
}

/// One row of the wedding listing, shaped for the current session user.
#[derive(Debug, Clone, Serialize)]
pub struct WeddingSummary {
    pub id: WeddingId,
    pub nearlywed_one: String,
    pub nearlywed_two: String,
    pub date: NaiveDate,
    pub guest_count: usize,
    /// The viewer's own RSVP to this wedding, if any.
    pub my_commitment: Option<CommitmentId>,
    pub can_delete: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuestView {
    pub commitment_id: CommitmentId,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeddingDetail {
    pub id: WeddingId,
    pub nearlywed_one: String,
    pub nearlywed_two: String,
    pub date: NaiveDate,
    pub address: String,
    pub creator_id: UserId,
    pub can_delete: bool,
    pub guests: Vec<GuestView>,
}

// -- Commitments --

/// The RSVP form. A missing or malformed `wedding_id` reads as the unset id
/// so the validator can report it.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct CommitmentForm {
    #[serde(deserialize_with = "lenient_wedding_id")]
    pub wedding_id: WeddingId,
}

fn lenient_wedding_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<WeddingId, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(WeddingId::from_param(&raw))
}

// -- Validation --

/// Validation failures keyed by form field, in the order they were raised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of messages across all fields.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str, message: &str) -> bool {
        self.get(field).iter().any(|m| m == message)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }
}
