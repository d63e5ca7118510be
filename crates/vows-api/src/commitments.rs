use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, info};

use vows_types::api::{CommitmentForm, FieldErrors};
use vows_types::models::{CommitmentId, NewCommitment, UserId};

use crate::auth::{AppState, AppStateInner};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::validation::{insert_commitment, validate_commitment};
use crate::weddings::signed_in_context;

fn rejected(state: &AppStateInner, user_id: UserId, errors: &FieldErrors) -> Result<Response, ApiError> {
    debug!("RSVP by user {} rejected: {:?}", user_id, errors);
    let mut context = signed_in_context(state, user_id)?;
    context.insert("errors", errors);
    state
        .views
        .render_with_status(StatusCode::UNPROCESSABLE_ENTITY, "commitment.html", &context)
}

/// POST /commitments/create — the guest is always the session user.
pub async fn create_commitment(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Form(form): Form<CommitmentForm>,
) -> Result<Response, ApiError> {
    let commitment = NewCommitment {
        user_id,
        wedding_id: form.wedding_id,
    };

    let store = state.db.is_available().then_some(&state.db);
    let errors = validate_commitment(&commitment, store)?;
    if !errors.is_empty() {
        return rejected(&state, user_id, &errors);
    }

    match insert_commitment(&state.db, &commitment)? {
        Ok(id) => {
            info!("User {} RSVP'd to wedding {} ({})", user_id, commitment.wedding_id, id);
            Ok(Redirect::to("/weddings").into_response())
        }
        Err(conflict) => rejected(&state, user_id, &conflict),
    }
}

/// POST /commitments/{id}/destroy — a no-op unless the caller is the guest.
pub async fn destroy_commitment(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let commitment_id = CommitmentId::from_param(&id);
    if state.db.delete_commitment_owned(commitment_id, user_id)? {
        info!("User {} withdrew RSVP {}", user_id, commitment_id);
    } else {
        debug!("User {} may not withdraw RSVP {}, ignoring", user_id, commitment_id);
    }

    Ok(Redirect::to("/weddings").into_response())
}
