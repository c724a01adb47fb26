//! Database seeding: member-ID backfill, admin bootstrap, sample catalog.

use minikart::{Account, Role};
use minikart_store::Product;
use tracing::info;

use crate::server::auth::hash_password;
use crate::server::now_millis;
use crate::server::state::AppState;

/// What a seeding run changed.
#[derive(Debug)]
pub struct SeedReport {
    pub backfilled: usize,
    pub admin_created: bool,
    pub products: usize,
}

/// Backfills member IDs, bootstraps the admin account if missing, and
/// replaces the product catalog (dropping all carts with it).
pub fn run(state: &AppState) -> anyhow::Result<SeedReport> {
    let backfilled = state.allocator.backfill(&state.store)?;

    let admin_created = match state.store.account_by_email(&state.config.admin_email)? {
        Some(_) => false,
        None => {
            let mut admin = Account::new(
                "Admin",
                state.config.admin_email.clone(),
                hash_password(&state.config.admin_password),
                now_millis(),
            );
            admin.role = Role::Admin;
            let member_id = state.allocator.ensure(&state.store, &mut admin)?;
            state.store.persist_account(&mut admin)?;
            info!("created admin account {member_id}");
            true
        }
    };

    let products = state.store.replace_products(sample_products())?.len();
    state.store.clear_carts()?;

    Ok(SeedReport {
        backfilled,
        admin_created,
        products,
    })
}

fn sample_products() -> Vec<Product> {
    vec![
        Product::new(
            "Cotton Shirt",
            "Comfortable cotton shirt",
            2_500,
            "Shirts",
            20,
            "/images/products/formal-shirt.jpg",
        ),
        Product::new(
            "T-Shirt",
            "Casual t-shirt",
            1_500,
            "Shirts",
            30,
            "/images/products/t-shirt.png",
        ),
        Product::new(
            "Denim Jeans",
            "Classic denim jeans",
            5_000,
            "Pants",
            15,
            "/images/products/jeans.jpg",
        ),
        Product::new(
            "Leather Jacket",
            "Stylish leather jacket",
            10_000,
            "Jackets",
            10,
            "/images/products/jacket.jpg",
        ),
        Product::new(
            "Sneakers",
            "Comfortable sneakers",
            4_000,
            "Shoes",
            25,
            "/images/products/sneakers.jpg",
        ),
        Product::new(
            "Leather Belt",
            "Elegant leather belt",
            7_500,
            "Accessories",
            12,
            "/images/products/belt.jpg",
        ),
        Product::new(
            "Sunglasses",
            "UV protection sunglasses",
            3_000,
            "Accessories",
            18,
            "/images/products/sunglasses.jpg",
        ),
    ]
}
