use axum::Json;
use axum::extract::{Path, State};
use minikart_store::Product;
use serde::Serialize;

use crate::server::error::ApiError;
use crate::server::state::SharedState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub price: u64,
    pub category: String,
    pub stock: u32,
    pub image: String,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.key.unwrap_or_default(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            category: product.category.clone(),
            stock: product.stock,
            image: product.image.clone(),
        }
    }
}

pub async fn list(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let catalog = state.store.products()?;
    Ok(Json(catalog.iter().map(ProductResponse::from).collect()))
}

pub async fn fetch(
    State(state): State<SharedState>,
    Path(key): Path<u64>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.store.product(key)?.ok_or(ApiError::NotFound)?;
    Ok(Json(ProductResponse::from(&product)))
}
