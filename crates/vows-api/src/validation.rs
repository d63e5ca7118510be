//! Field and cross-entity validation.
//!
//! Every validator runs its rules in a fixed order and collects
//! `(field, message)` pairs into [`FieldErrors`]. Rules that need stored state
//! go through [`ValidationStore`] so they can be exercised without SQLite.

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use validator::ValidateEmail;

use vows_db::{Database, is_unique_violation};
use vows_types::api::{FieldErrors, LoginForm, RegisterForm, WeddingForm};
use vows_types::models::{CommitmentId, NewCommitment, NewUser, NewWedding, UserId, WeddingId};

pub const MIN_PASSWORD_LEN: usize = 8;

pub mod field {
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const EMAIL: &str = "email";
    pub const PASSWORD: &str = "password";
    pub const CONFIRM_PASSWORD: &str = "confirm_password";
    pub const NEARLYWED_ONE: &str = "nearlywed_one";
    pub const NEARLYWED_TWO: &str = "nearlywed_two";
    pub const DATE: &str = "date";
    pub const ADDRESS: &str = "address";
    pub const COMMITMENT: &str = "commitment";
    pub const GUEST: &str = "guest";
    pub const WEDDING: &str = "wedding";
}

pub mod message {
    pub const FIRST_NAME_REQUIRED: &str = "First name is required.";
    pub const LAST_NAME_REQUIRED: &str = "Last name is required.";
    pub const EMAIL_REQUIRED: &str = "Email is required.";
    pub const EMAIL_INVALID: &str = "The Email field is not a valid e-mail address.";
    pub const EMAIL_NOT_UNIQUE: &str = "Email must be unique.";
    pub const PASSWORD_REQUIRED: &str = "Password is required.";
    pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters.";
    pub const PASSWORDS_DIFFER: &str = "Passwords must match.";
    pub const LOGIN_INVALID: &str = "Email or Password is invalid";

    pub const NEARLYWEDS_REQUIRED: &str = "Wedding must have two Nearlyweds.";
    pub const DATE_REQUIRED: &str = "Wedding must have date.";
    pub const DATE_NOT_FUTURE: &str = "Wedding must be in future.";
    pub const ADDRESS_REQUIRED: &str = "Wedding must have address.";

    pub const COMMITMENT_UNSET: &str = "Commitment isn't fully initialized";
    pub const NO_CONTEXT: &str = "Could not retrieve database context to perform validation.";
    pub const ALREADY_COMMITTED: &str = "The commitment must not exist already.";
    pub const GUEST_MISSING: &str = "The RSVPing guest must exist.";
    pub const WEDDING_MISSING: &str = "The wedding must exist in order to RSVP.";
}

use field::*;
use message::*;

/// Read access to the stored state the cross-entity rules depend on.
pub trait ValidationStore {
    fn email_taken(&self, email: &str) -> Result<bool>;
    fn user_exists(&self, id: UserId) -> Result<bool>;
    fn wedding_exists(&self, id: WeddingId) -> Result<bool>;
    fn commitment_exists(&self, user_id: UserId, wedding_id: WeddingId) -> Result<bool>;
}

impl ValidationStore for Database {
    fn email_taken(&self, email: &str) -> Result<bool> {
        self.email_exists(email)
    }

    fn user_exists(&self, id: UserId) -> Result<bool> {
        Database::user_exists(self, id)
    }

    fn wedding_exists(&self, id: WeddingId) -> Result<bool> {
        Database::wedding_exists(self, id)
    }

    fn commitment_exists(&self, user_id: UserId, wedding_id: WeddingId) -> Result<bool> {
        Database::commitment_exists(self, user_id, wedding_id)
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn validate_registration<S>(form: &RegisterForm, store: &S) -> Result<FieldErrors>
where
    S: ValidationStore + ?Sized,
{
    let mut errors = FieldErrors::new();

    if blank(&form.first_name) {
        errors.add(FIRST_NAME, FIRST_NAME_REQUIRED);
    }
    if blank(&form.last_name) {
        errors.add(LAST_NAME, LAST_NAME_REQUIRED);
    }

    if blank(&form.email) {
        errors.add(EMAIL, EMAIL_REQUIRED);
    } else if !form.email.validate_email() {
        errors.add(EMAIL, EMAIL_INVALID);
    } else if store.email_taken(&form.email)? {
        errors.add(EMAIL, EMAIL_NOT_UNIQUE);
    }

    if form.password.is_empty() {
        errors.add(PASSWORD, PASSWORD_REQUIRED);
    } else if form.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(PASSWORD, PASSWORD_TOO_SHORT);
    }

    if form.confirm_password != form.password {
        errors.add(CONFIRM_PASSWORD, PASSWORDS_DIFFER);
    }

    Ok(errors)
}

/// Shape checks only. Credential checks happen in the login handler so that
/// an unknown email and a wrong password look the same.
pub fn validate_login(form: &LoginForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if blank(&form.email) {
        errors.add(EMAIL, EMAIL_REQUIRED);
    } else if !form.email.validate_email() {
        errors.add(EMAIL, EMAIL_INVALID);
    }
    if form.password.is_empty() {
        errors.add(PASSWORD, PASSWORD_REQUIRED);
    }

    errors
}

/// Accepts `<input type="date">` and `<input type="datetime-local">` values.
/// Any time part is dropped.
pub fn parse_wedding_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
                .ok()
                .map(|dt| dt.date())
        })
}

/// Builds the insert payload for a wedding. `creator` is the session user;
/// nothing in the form can override it.
pub fn validate_wedding(
    form: &WeddingForm,
    creator: UserId,
    today: NaiveDate,
) -> Result<NewWedding, FieldErrors> {
    let mut errors = FieldErrors::new();

    if blank(&form.nearlywed_one) {
        errors.add(NEARLYWED_ONE, NEARLYWEDS_REQUIRED);
    }
    if blank(&form.nearlywed_two) {
        errors.add(NEARLYWED_TWO, NEARLYWEDS_REQUIRED);
    }

    let date = parse_wedding_date(&form.date);
    match date {
        None => errors.add(DATE, DATE_REQUIRED),
        Some(date) if date <= today => errors.add(DATE, DATE_NOT_FUTURE),
        Some(_) => {}
    }

    if blank(&form.address) {
        errors.add(ADDRESS, ADDRESS_REQUIRED);
    }

    match date {
        Some(date) if errors.is_empty() => Ok(NewWedding {
            nearlywed_one: form.nearlywed_one.trim().to_string(),
            nearlywed_two: form.nearlywed_two.trim().to_string(),
            date,
            address: form.address.trim().to_string(),
            creator_id: creator,
        }),
        _ => Err(errors),
    }
}

/// RSVP rules. Each of the first three failures ends the pass; the two
/// existence failures are reported together.
pub fn validate_commitment<S>(commitment: &NewCommitment, store: Option<&S>) -> Result<FieldErrors>
where
    S: ValidationStore + ?Sized,
{
    let mut errors = FieldErrors::new();

    if commitment.user_id.is_unset() || commitment.wedding_id.is_unset() {
        errors.add(COMMITMENT, COMMITMENT_UNSET);
        return Ok(errors);
    }

    let Some(store) = store else {
        errors.add(COMMITMENT, NO_CONTEXT);
        return Ok(errors);
    };

    let guest_exists = store.user_exists(commitment.user_id)?;
    let wedding_exists = store.wedding_exists(commitment.wedding_id)?;

    if guest_exists
        && wedding_exists
        && store.commitment_exists(commitment.user_id, commitment.wedding_id)?
    {
        errors.add(COMMITMENT, ALREADY_COMMITTED);
        return Ok(errors);
    }

    if !guest_exists {
        errors.add(GUEST, GUEST_MISSING);
    }
    if !wedding_exists {
        errors.add(WEDDING, WEDDING_MISSING);
    }

    Ok(errors)
}

/// An insert that a UNIQUE constraint may refuse after validation passed.
pub type Inserted<T> = std::result::Result<T, FieldErrors>;

/// Insert a registered user. Losing the email to a concurrent registration
/// reports the same error the validator would have.
pub fn insert_user(db: &Database, user: &NewUser) -> Result<Inserted<UserId>> {
    unique_or_field_error(db.create_user(user), EMAIL, EMAIL_NOT_UNIQUE)
}

/// Insert an RSVP. A racing duplicate reports as an existing commitment.
pub fn insert_commitment(db: &Database, commitment: &NewCommitment) -> Result<Inserted<CommitmentId>> {
    unique_or_field_error(db.create_commitment(commitment), COMMITMENT, ALREADY_COMMITTED)
}

fn unique_or_field_error<T>(
    inserted: Result<T>,
    field: &'static str,
    message: &'static str,
) -> Result<Inserted<T>> {
    match inserted {
        Ok(id) => Ok(Ok(id)),
        Err(e) if is_unique_violation(&e) => {
            let mut errors = FieldErrors::new();
            errors.add(field, message);
            Ok(Err(errors))
        }
        Err(e) => Err(e),
    }
}
