use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use minikart_store::Cart;
use serde::{Deserialize, Serialize};

use crate::server::error::ApiError;
use crate::server::routes::authenticate;
use crate::server::routes::products::ProductResponse;
use crate::server::state::{AppState, SharedState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: u64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct CartLineResponse {
    pub product: ProductResponse,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartLineResponse>,
}

/// Renders a cart with its lines resolved against the live catalog. Lines
/// whose product vanished are skipped.
fn render(state: &AppState, cart: &Cart) -> Result<CartResponse, ApiError> {
    let mut items = Vec::with_capacity(cart.lines.len());
    for line in &cart.lines {
        if let Some(product) = state.store.product(line.product)? {
            items.push(CartLineResponse {
                product: ProductResponse::from(&product),
                quantity: line.quantity,
            });
        }
    }
    Ok(CartResponse { items })
}

fn cart_of(state: &AppState, account: u64) -> Result<Cart, ApiError> {
    Ok(state
        .store
        .cart_for(account)?
        .unwrap_or_else(|| Cart::empty(account)))
}

pub async fn fetch(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<CartResponse>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let cart = cart_of(&state, caller.key)?;
    Ok(Json(render(&state, &cart)?))
}

pub async fn add(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let caller = authenticate(&state, &headers)?;

    if req.quantity == 0 {
        return Err(ApiError::BadRequest("Quantity must be at least 1".into()));
    }
    if state.store.product(req.product_id)?.is_none() {
        return Err(ApiError::NotFound);
    }

    let mut cart = cart_of(&state, caller.key)?;
    cart.add(req.product_id, req.quantity);
    state.store.persist_cart(&mut cart)?;

    Ok(Json(render(&state, &cart)?))
}

pub async fn update(
    State(state): State<SharedState>,
    Path(product): Path<u64>,
    headers: HeaderMap,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let caller = authenticate(&state, &headers)?;

    if req.quantity == 0 {
        return Err(ApiError::BadRequest("Quantity must be at least 1".into()));
    }

    let mut cart = cart_of(&state, caller.key)?;
    if cart.set_quantity(product, req.quantity) {
        state.store.persist_cart(&mut cart)?;
    }
    Ok(Json(render(&state, &cart)?))
}

pub async fn remove(
    State(state): State<SharedState>,
    Path(product): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<CartResponse>, ApiError> {
    let caller = authenticate(&state, &headers)?;

    let mut cart = cart_of(&state, caller.key)?;
    cart.remove(product);
    state.store.persist_cart(&mut cart)?;

    Ok(Json(render(&state, &cart)?))
}
