use std::collections::HashMap;

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use tera::Context;
use tracing::{debug, info};

use vows_db::models::{CommitmentRow, GuestRow, WeddingRow};
use vows_types::api::{FieldErrors, GuestView, WeddingDetail, WeddingForm, WeddingSummary};
use vows_types::models::{UserId, WeddingId};

use crate::auth::{AppState, AppStateInner};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::validation::validate_wedding;

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Base template context for signed-in pages.
pub(crate) fn signed_in_context(state: &AppStateInner, user_id: UserId) -> Result<Context, ApiError> {
    let mut context = Context::new();
    if let Some(user) = state.db.get_user_by_id(user_id)? {
        context.insert(
            "viewer",
            &serde_json::json!({ "first_name": user.first_name, "last_name": user.last_name }),
        );
    }
    Ok(context)
}

/// Shape listing rows for `viewer`: pick out their own RSVP and decide
/// whether they may delete each wedding.
pub fn project_listing(
    rows: Vec<WeddingRow>,
    viewer_commitments: &[CommitmentRow],
    viewer: UserId,
) -> Vec<WeddingSummary> {
    let mine: HashMap<WeddingId, _> = viewer_commitments
        .iter()
        .filter(|c| c.user_id == viewer)
        .map(|c| (c.wedding_id, c.id))
        .collect();

    rows.into_iter()
        .map(|row| WeddingSummary {
            my_commitment: mine.get(&row.id).copied(),
            can_delete: row.creator_id == viewer,
            id: row.id,
            nearlywed_one: row.nearlywed_one,
            nearlywed_two: row.nearlywed_two,
            date: row.date,
            guest_count: row.guest_count,
        })
        .collect()
}

pub fn project_detail(row: WeddingRow, guests: Vec<GuestRow>, viewer: UserId) -> WeddingDetail {
    WeddingDetail {
        can_delete: row.creator_id == viewer,
        id: row.id,
        nearlywed_one: row.nearlywed_one,
        nearlywed_two: row.nearlywed_two,
        date: row.date,
        address: row.address,
        creator_id: row.creator_id,
        guests: guests
            .into_iter()
            .map(|g| GuestView {
                commitment_id: g.commitment_id,
                user_id: g.user_id,
                first_name: g.first_name,
                last_name: g.last_name,
            })
            .collect(),
    }
}

/// GET /weddings
pub async fn list_weddings(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    let rows = state.db.list_weddings()?;
    let mine = state.db.commitments_for_user(user_id)?;
    let weddings = project_listing(rows, &mine, user_id);

    let mut context = signed_in_context(&state, user_id)?;
    context.insert("weddings", &weddings);
    Ok(state.views.render("weddings.html", &context)?.into_response())
}

/// GET /weddings/new
pub async fn new_wedding(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    let mut context = signed_in_context(&state, user_id)?;
    context.insert("form", &WeddingForm::default());
    context.insert("errors", &FieldErrors::new());
    Ok(state.views.render("new_wedding.html", &context)?.into_response())
}

/// POST /weddings/create
pub async fn create_wedding(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Form(form): Form<WeddingForm>,
) -> Result<Response, ApiError> {
    let wedding = match validate_wedding(&form, user_id, today()) {
        Ok(wedding) => wedding,
        Err(errors) => {
            let mut context = signed_in_context(&state, user_id)?;
            context.insert("form", &form);
            context.insert("errors", &errors);
            return state
                .views
                .render_with_status(StatusCode::UNPROCESSABLE_ENTITY, "new_wedding.html", &context);
        }
    };

    // The creator is not RSVP'd automatically.
    let wedding_id = state.db.create_wedding(&wedding)?;
    info!(
        "User {} created wedding {} ({} & {} on {})",
        user_id, wedding_id, wedding.nearlywed_one, wedding.nearlywed_two, wedding.date
    );

    Ok(Redirect::to("/weddings").into_response())
}

/// GET /weddings/{id} — unknown ids go back to the listing.
pub async fn show_wedding(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let wedding_id = WeddingId::from_param(&id);
    let Some(row) = state.db.get_wedding(wedding_id)? else {
        debug!("Wedding {} not found, redirecting", wedding_id);
        return Ok(Redirect::to("/weddings").into_response());
    };

    let guests = state.db.guests_for_wedding(wedding_id)?;
    let wedding = project_detail(row, guests, user_id);

    let mut context = signed_in_context(&state, user_id)?;
    context.insert("wedding", &wedding);
    Ok(state.views.render("wedding.html", &context)?.into_response())
}

/// POST /weddings/{id}/destroy — a no-op unless the caller created it.
pub async fn destroy_wedding(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let wedding_id = WeddingId::from_param(&id);
    if state.db.delete_wedding_owned(wedding_id, user_id)? {
        info!("User {} deleted wedding {}", user_id, wedding_id);
    } else {
        debug!("User {} may not delete wedding {}, ignoring", user_id, wedding_id);
    }

    Ok(Redirect::to("/weddings").into_response())
}
