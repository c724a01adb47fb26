pub mod cart;
pub mod orders;
pub mod products;
pub mod users;

use axum::Router;
use axum::http::{HeaderMap, header};
use axum::routing::{get, post, put};
use minikart::Account;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::server::auth::verify_token;
use crate::server::error::ApiError;
use crate::server::now_millis;
use crate::server::state::{AppState, SharedState};

/// Builds the full application router: the REST API, permissive CORS, and
/// an optional static frontend behind it.
pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/api/users/register", post(users::register))
        .route("/api/users/login", post(users::login))
        .route(
            "/api/users/profile",
            get(users::profile).put(users::update_profile),
        )
        .route("/api/products", get(products::list))
        .route("/api/products/{key}", get(products::fetch))
        .route("/api/cart", get(cart::fetch).post(cart::add))
        .route("/api/cart/{product}", put(cart::update).delete(cart::remove))
        .route("/api/orders", post(orders::create).get(orders::list))
        .route(
            "/api/orders/{key}",
            get(orders::fetch).put(orders::update_status),
        )
        .with_state(state.clone());

    if let Some(dir) = &state.config.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors)
}

/// An authenticated caller: the account record plus its store key.
pub(crate) struct Caller {
    pub key: u64,
    pub account: Account,
}

/// Resolves the bearer token into a stored account.
///
/// Tokens that are missing, malformed, expired, or that reference a record
/// no longer in the store all collapse into [`ApiError::Unauthorized`].
pub(crate) fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Caller, ApiError> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let claims = verify_token(&state.config.token_secret, bearer, now_millis())
        .ok_or(ApiError::Unauthorized)?;

    let account = state
        .store
        .account(claims.account)?
        .ok_or(ApiError::Unauthorized)?;
    let key = account.key.ok_or(ApiError::Unauthorized)?;

    Ok(Caller { key, account })
}
