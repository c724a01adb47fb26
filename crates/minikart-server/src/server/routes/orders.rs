use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use minikart_store::{Address, Cart, Order, OrderLine, OrderStatus, Store};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::server::error::ApiError;
use crate::server::now_millis;
use crate::server::routes::authenticate;
use crate::server::state::SharedState;

#[derive(Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub address: Address,
}

#[derive(Deserialize)]
pub struct UpdateOrderRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineResponse {
    pub product_id: u64,
    pub quantity: u32,
    pub unit_price: u64,
    pub subtotal: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: u64,
    pub items: Vec<OrderLineResponse>,
    pub total: u64,
    pub status: OrderStatus,
    pub address: Address,
    pub created_at: u64,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.key.unwrap_or_default(),
            items: order
                .lines
                .iter()
                .map(|line| OrderLineResponse {
                    product_id: line.product,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    subtotal: line.subtotal(),
                })
                .collect(),
            total: order.total,
            status: order.status,
            address: order.address.clone(),
            created_at: order.created_at,
        }
    }
}

/// Prices cart lines from the live catalog, dropping lines whose product no
/// longer exists.
fn price_lines(store: &Store, cart: &Cart) -> Result<Vec<OrderLine>, ApiError> {
    let mut lines = Vec::with_capacity(cart.lines.len());
    for line in &cart.lines {
        if let Some(product) = store.product(line.product)? {
            lines.push(OrderLine {
                product: line.product,
                quantity: line.quantity,
                unit_price: product.price,
            });
        }
    }
    Ok(lines)
}

pub async fn create(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let caller = authenticate(&state, &headers)?;

    let mut cart = state
        .store
        .cart_for(caller.key)?
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Cart is empty".into()))?;

    let lines = price_lines(&state.store, &cart)?;
    if lines.is_empty() {
        return Err(ApiError::BadRequest("No valid items in cart".into()));
    }

    let mut order = Order::place(caller.key, lines, req.address, now_millis());
    state.store.persist_order(&mut order)?;

    cart.lines.clear();
    state.store.persist_cart(&mut cart)?;

    info!(
        "order placed: account={} total={}",
        caller.key, order.total
    );
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

pub async fn list(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let orders = state.store.orders_for(caller.key)?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

pub async fn fetch(
    State(state): State<SharedState>,
    Path(key): Path<u64>,
    headers: HeaderMap,
) -> Result<Json<OrderResponse>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let order = state.store.order(key)?.ok_or(ApiError::NotFound)?;

    if order.account != caller.key && !caller.account.is_admin() {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(OrderResponse::from(&order)))
}

pub async fn update_status(
    State(state): State<SharedState>,
    Path(key): Path<u64>,
    headers: HeaderMap,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let caller = authenticate(&state, &headers)?;
    if !caller.account.is_admin() {
        return Err(ApiError::Forbidden);
    }

    let mut order = state.store.order(key)?.ok_or(ApiError::NotFound)?;
    order.status = req.status;
    state.store.persist_order(&mut order)?;

    Ok(Json(OrderResponse::from(&order)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::routes::testing::{auth_headers, temp_state};
    use minikart::{Account, Role};
    use minikart_store::Product;

    fn seeded_account(state: &SharedState, email: &str, role: Role) -> u64 {
        let mut account = Account::new("Someone", email, "hash", 0);
        account.role = role;
        state.store.persist_account(&mut account).unwrap();
        account.key.unwrap()
    }

    fn seeded_product(state: &SharedState, name: &str, price: u64) -> u64 {
        let mut product = Product::new(name, "", price, "Misc", 10, "");
        state.store.persist_product(&mut product).unwrap();
        product.key.unwrap()
    }

    fn fill_cart(state: &SharedState, account: u64, lines: &[(u64, u32)]) {
        let mut cart = Cart::empty(account);
        for &(product, quantity) in lines {
            cart.add(product, quantity);
        }
        state.store.persist_cart(&mut cart).unwrap();
    }

    #[tokio::test]
    async fn checkout_prices_totals_and_clears_the_cart() {
        let (_dir, state) = temp_state();
        let account = seeded_account(&state, "ada@example.com", Role::User);
        let shirt = seeded_product(&state, "Shirt", 2_500);
        let belt = seeded_product(&state, "Belt", 7_500);
        fill_cart(&state, account, &[(shirt, 2), (belt, 1)]);

        let (status, Json(order)) = create(
            State(state.clone()),
            auth_headers(&state, account),
            Json(CheckoutRequest {
                address: Address {
                    street: "1 Main St".into(),
                    city: "Springfield".into(),
                    zip: "12345".into(),
                },
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order.total, 12_500);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 2);

        let cart = state.store.cart_for(account).unwrap().unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn checkout_rejects_empty_and_stale_carts() {
        let (_dir, state) = temp_state();
        let account = seeded_account(&state, "ada@example.com", Role::User);

        let empty = create(
            State(state.clone()),
            auth_headers(&state, account),
            Json(CheckoutRequest {
                address: Address::default(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(empty, ApiError::BadRequest(_)));

        // A cart whose only line references a vanished product.
        fill_cart(&state, account, &[(999, 1)]);
        let stale = create(
            State(state.clone()),
            auth_headers(&state, account),
            Json(CheckoutRequest {
                address: Address::default(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(stale, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn orders_are_visible_to_their_owner_and_admins_only() {
        let (_dir, state) = temp_state();
        let ada = seeded_account(&state, "ada@example.com", Role::User);
        let bob = seeded_account(&state, "bob@example.com", Role::User);
        let admin = seeded_account(&state, "admin@example.com", Role::Admin);
        let shirt = seeded_product(&state, "Shirt", 2_500);
        fill_cart(&state, ada, &[(shirt, 1)]);

        let (_, Json(order)) = create(
            State(state.clone()),
            auth_headers(&state, ada),
            Json(CheckoutRequest {
                address: Address::default(),
            }),
        )
        .await
        .unwrap();

        let foreign = fetch(
            State(state.clone()),
            Path(order.id),
            auth_headers(&state, bob),
        )
        .await
        .unwrap_err();
        assert!(matches!(foreign, ApiError::Forbidden));

        let as_admin = fetch(
            State(state.clone()),
            Path(order.id),
            auth_headers(&state, admin),
        )
        .await
        .unwrap();
        assert_eq!(as_admin.total, 2_500);

        let Json(mine) = list(State(state.clone()), auth_headers(&state, ada))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        let Json(bobs) = list(State(state.clone()), auth_headers(&state, bob))
            .await
            .unwrap();
        assert!(bobs.is_empty());
    }

    #[tokio::test]
    async fn only_admins_advance_order_status() {
        let (_dir, state) = temp_state();
        let ada = seeded_account(&state, "ada@example.com", Role::User);
        let admin = seeded_account(&state, "admin@example.com", Role::Admin);
        let shirt = seeded_product(&state, "Shirt", 2_500);
        fill_cart(&state, ada, &[(shirt, 1)]);

        let (_, Json(order)) = create(
            State(state.clone()),
            auth_headers(&state, ada),
            Json(CheckoutRequest {
                address: Address::default(),
            }),
        )
        .await
        .unwrap();

        let denied = update_status(
            State(state.clone()),
            Path(order.id),
            auth_headers(&state, ada),
            Json(UpdateOrderRequest {
                status: OrderStatus::Shipped,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(denied, ApiError::Forbidden));

        let Json(shipped) = update_status(
            State(state.clone()),
            Path(order.id),
            auth_headers(&state, admin),
            Json(UpdateOrderRequest {
                status: OrderStatus::Shipped,
            }),
        )
        .await
        .unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);
        assert_eq!(
            state.store.order(order.id).unwrap().unwrap().status,
            OrderStatus::Shipped
        );
    }
}
