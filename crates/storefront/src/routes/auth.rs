//! Authentication route handlers.
//!
//! Email/password login and signup, Google sign-in through Google Identity
//! Services, and logout. Provider errors are shown as friendly messages on
//! the form they came from.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tower_sessions::cookie::Cookie;
use tracing::instrument;

use kirana_core::UserProfile;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Cookie and form field Google Identity Services uses for CSRF protection.
const GOOGLE_CSRF_FIELD: &str = "g_csrf_token";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Signup form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Google Identity Services redirect-mode callback.
#[derive(Debug, Deserialize)]
pub struct GoogleForm {
    pub credential: String,
    pub g_csrf_token: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub email: String,
    pub error: Option<String>,
    pub google_client_id: Option<String>,
    pub google_login_uri: String,
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub user: Option<CurrentUser>,
    pub name: String,
    pub email: String,
    pub error: Option<String>,
    pub google_client_id: Option<String>,
    pub google_login_uri: String,
}

fn google_login_uri(state: &AppState) -> String {
    format!("{}/auth/google", state.config().base_url.trim_end_matches('/'))
}

fn login_template(state: &AppState, email: String, error: Option<String>) -> LoginTemplate {
    LoginTemplate {
        user: None,
        email,
        error,
        google_client_id: state.config().google_client_id.clone(),
        google_login_uri: google_login_uri(state),
    }
}

fn auth_failure<T: IntoResponse>(err: &AuthError, page: T) -> Response {
    if err.is_internal() {
        tracing::error!(error = %err, "Authentication backend failure");
    } else {
        tracing::info!(error = %err, "Authentication rejected");
    }
    (AppError::status_for_auth(err), page).into_response()
}

/// Store the user in the session and go to the listing.
async fn start_session(session: &Session, profile: &UserProfile) -> Response {
    let user = CurrentUser::from(profile);
    if let Err(e) = set_current_user(session, &user).await {
        tracing::error!(error = %e, "Failed to set session");
        return AppError::Internal("session".to_string()).into_response();
    }
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Redirect::to("/").into_response()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    login_template(&state, String::new(), None).into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let auth = AuthService::new(state.store(), state.auth_provider());
    match auth.sign_in(&form.email, &form.password).await {
        Ok(profile) => start_session(&session, &profile).await,
        Err(e) => {
            let page = login_template(&state, form.email, Some(e.user_message()));
            auth_failure(&e, page)
        }
    }
}

// =============================================================================
// Signup Routes
// =============================================================================

/// Display the signup page.
pub async fn signup_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Response {
    if user.is_some() {
        return Redirect::to("/").into_response();
    }
    SignupTemplate {
        user: None,
        name: String::new(),
        email: String::new(),
        error: None,
        google_client_id: state.config().google_client_id.clone(),
        google_login_uri: google_login_uri(&state),
    }
    .into_response()
}

/// Handle signup form submission.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Response {
    let auth = AuthService::new(state.store(), state.auth_provider());
    match auth.sign_up(&form.name, &form.email, &form.password).await {
        Ok(profile) => start_session(&session, &profile).await,
        Err(e) => {
            let page = SignupTemplate {
                user: None,
                error: Some(e.user_message()),
                google_client_id: state.config().google_client_id.clone(),
                google_login_uri: google_login_uri(&state),
                name: form.name,
                email: form.email,
            };
            auth_failure(&e, page)
        }
    }
}

// =============================================================================
// Google Sign-In
// =============================================================================

/// Whether the double-submit CSRF token from Google matches its cookie.
///
/// Requests without a body token (tests, non-GIS clients) are let through;
/// a body token without a matching cookie is rejected.
fn google_csrf_ok(headers: &HeaderMap, body_token: Option<&str>) -> bool {
    let Some(body_token) = body_token else {
        return true;
    };
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .any(|cookie| cookie.name() == GOOGLE_CSRF_FIELD && cookie.value() == body_token)
}

/// Handle the Google Identity Services credential post.
#[instrument(skip_all)]
pub async fn google(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<GoogleForm>,
) -> Response {
    if !google_csrf_ok(&headers, form.g_csrf_token.as_deref()) {
        tracing::warn!("Google sign-in CSRF token mismatch");
        return (
            StatusCode::BAD_REQUEST,
            login_template(
                &state,
                String::new(),
                Some("Google sign-in failed. Please try again".to_string()),
            ),
        )
            .into_response();
    }

    let auth = AuthService::new(state.store(), state.auth_provider());
    match auth.sign_in_with_google(&form.credential).await {
        Ok(profile) => start_session(&session, &profile).await,
        Err(e) => {
            let page = login_template(&state, String::new(), Some(e.user_message()));
            auth_failure(&e, page)
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }
    clear_sentry_user();
    Redirect::to("/")
}
