use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tera::Context;
use tracing::{info, warn};

use vows_db::Database;
use vows_types::api::{FieldErrors, LoginForm, RegisterForm, RegisterValues};
use vows_types::models::NewUser;

use crate::error::ApiError;
use crate::session::{Session, end_session, start_session};
use crate::validation::{field, insert_user, message, validate_login, validate_registration};
use crate::views::Views;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub views: Views,
    pub hasher: Argon2<'static>,
    pub secure_cookies: bool,
    /// Verified against when an email is unknown so both login failures cost
    /// the same.
    dummy_hash: String,
}

impl AppStateInner {
    pub fn new(db: Database, hasher: Argon2<'static>, secure_cookies: bool) -> Result<Self, ApiError> {
        let dummy_hash = hash_password(&hasher, "not-a-real-password")?;
        Ok(Self {
            db,
            views: Views::new()?,
            hasher,
            secure_cookies,
            dummy_hash,
        })
    }
}

pub fn hash_password(hasher: &Argon2<'_>, password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(hasher.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// False for a wrong password and for a stored hash that does not parse.
pub fn verify_password(hasher: &Argon2<'_>, password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => hasher.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            warn!("Unparseable password hash in store: {}", e);
            false
        }
    }
}

/// State of the landing page, which hosts both the register and login forms.
#[derive(Default)]
struct Landing {
    register: RegisterValues,
    register_errors: FieldErrors,
    login_email: String,
    login_errors: FieldErrors,
}

impl Landing {
    fn render(&self, views: &Views) -> Result<Response, ApiError> {
        let mut context = Context::new();
        context.insert("register", &self.register);
        context.insert("register_errors", &self.register_errors);
        context.insert("login_email", &self.login_email);
        context.insert("login_errors", &self.login_errors);

        let status = if self.register_errors.is_empty() && self.login_errors.is_empty() {
            StatusCode::OK
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        };
        views.render_with_status(status, "index.html", &context)
    }
}

/// GET / — register and login forms.
pub async fn index(State(state): State<AppState>, session: Session) -> Result<Response, ApiError> {
    if session.is_authenticated() {
        return Ok(Redirect::to("/weddings").into_response());
    }
    Landing::default().render(&state.views)
}

/// POST /users/create
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, ApiError> {
    if session.is_authenticated() {
        return Ok(Redirect::to("/weddings").into_response());
    }

    let mut errors = validate_registration(&form, &state.db)?;
    if errors.is_empty() {
        let user = NewUser {
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            email: form.email.clone(),
            password_hash: hash_password(&state.hasher, &form.password)?,
        };

        match insert_user(&state.db, &user)? {
            Ok(user_id) => {
                info!("Registered user {} <{}>", user_id, user.email);
                let jar = start_session(&state, jar, user_id)?;
                return Ok((jar, Redirect::to("/weddings")).into_response());
            }
            Err(conflict) => errors = conflict,
        }
    }

    Landing {
        register: RegisterValues::from(&form),
        register_errors: errors,
        ..Default::default()
    }
    .render(&state.views)
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    if session.is_authenticated() {
        return Ok(Redirect::to("/weddings").into_response());
    }

    let mut errors = validate_login(&form);
    if errors.is_empty() {
        let user = state.db.get_user_by_email(&form.email)?;

        let verified = match &user {
            Some(user) => verify_password(&state.hasher, &form.password, &user.password),
            None => {
                verify_password(&state.hasher, &form.password, &state.dummy_hash);
                false
            }
        };

        match user {
            Some(user) if verified => {
                info!("User {} logged in", user.id);
                let jar = start_session(&state, jar, user.id)?;
                return Ok((jar, Redirect::to("/weddings")).into_response());
            }
            _ => errors.add(field::EMAIL, message::LOGIN_INVALID),
        }
    }

    Landing {
        login_email: form.email,
        login_errors: errors,
        ..Default::default()
    }
    .render(&state.views)
}

/// POST /logout — always succeeds.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<Response, ApiError> {
    let jar = end_session(&state, jar)?;
    Ok((jar, Redirect::to("/")).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{Algorithm, Params, Version};

    fn cheap_hasher() -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::new(8, 1, 1, None).unwrap())
    }

    #[test]
    fn hash_then_verify() {
        let hasher = cheap_hasher();
        let hash = hash_password(&hasher, "password1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hasher, "password1", &hash));
        assert!(!verify_password(&hasher, "password2", &hash));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let hasher = cheap_hasher();
        let a = hash_password(&hasher, "password1").unwrap();
        let b = hash_password(&hasher, "password1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password(&cheap_hasher(), "password1", "plaintext"));
    }
}
