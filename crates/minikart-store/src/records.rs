use serde::{Deserialize, Serialize};

/// A catalog item. Prices are integer minor currency units.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    /// Store-assigned key; `None` until first persisted.
    pub key: Option<u64>,
    pub name: String,
    pub description: String,
    pub price: u64,
    pub category: String,
    pub stock: u32,
    /// Path of the product image under the static frontend directory.
    pub image: String,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: u64,
        category: impl Into<String>,
        stock: u32,
        image: impl Into<String>,
    ) -> Self {
        Self {
            key: None,
            name: name.into(),
            description: description.into(),
            price,
            category: category.into(),
            stock,
            image: image.into(),
        }
    }
}

/// One line in a cart: a product reference and a quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: u64,
    pub quantity: u32,
}

/// Per-account shopping cart. One document per account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cart {
    pub key: Option<u64>,
    pub account: u64,
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn empty(account: u64) -> Self {
        Self {
            key: None,
            account,
            lines: Vec::new(),
        }
    }

    /// Adds quantity for a product, merging into an existing line instead of
    /// appending a duplicate.
    pub fn add(&mut self, product: u64, quantity: u32) {
        match self.lines.iter_mut().find(|l| l.product == product) {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(CartLine { product, quantity }),
        }
    }

    /// Rewrites the quantity of an existing line. Returns false if the
    /// product is not in the cart.
    pub fn set_quantity(&mut self, product: u64, quantity: u32) -> bool {
        match self.lines.iter_mut().find(|l| l.product == product) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, product: u64) {
        self.lines.retain(|l| l.product != product);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Order lifecycle, advanced by admins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
}

/// Shipping address captured at checkout.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub zip: String,
}

/// One line of a placed order, priced from the catalog at checkout time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product: u64,
    pub quantity: u32,
    pub unit_price: u64,
}

impl OrderLine {
    pub fn subtotal(&self) -> u64 {
        self.unit_price * u64::from(self.quantity)
    }
}

/// A placed order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub key: Option<u64>,
    pub account: u64,
    pub lines: Vec<OrderLine>,
    /// Sum of line subtotals, fixed at checkout.
    pub total: u64,
    pub status: OrderStatus,
    pub address: Address,
    /// Unix millis at checkout.
    pub created_at: u64,
}

impl Order {
    /// Builds a pending order, computing the total from its lines.
    pub fn place(account: u64, lines: Vec<OrderLine>, address: Address, now_millis: u64) -> Self {
        let total = lines.iter().map(OrderLine::subtotal).sum();
        Self {
            key: None,
            account,
            lines,
            total,
            status: OrderStatus::Pending,
            address,
            created_at: now_millis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cart_add_merges_duplicate_lines() {
        let mut cart = Cart::empty(1);
        cart.add(7, 2);
        cart.add(9, 1);
        cart.add(7, 3);

        assert_eq!(
            cart.lines,
            vec![
                CartLine {
                    product: 7,
                    quantity: 5
                },
                CartLine {
                    product: 9,
                    quantity: 1
                },
            ]
        );
    }

    #[test]
    fn cart_set_quantity_only_touches_existing_lines() {
        let mut cart = Cart::empty(1);
        cart.add(7, 2);

        assert!(cart.set_quantity(7, 6));
        assert!(!cart.set_quantity(8, 1));
        assert_eq!(cart.lines, vec![CartLine {
            product: 7,
            quantity: 6
        }]);
    }

    #[test]
    fn order_total_sums_line_subtotals() {
        let lines = vec![
            OrderLine {
                product: 1,
                quantity: 2,
                unit_price: 2_500,
            },
            OrderLine {
                product: 2,
                quantity: 1,
                unit_price: 10_000,
            },
        ];
        let order = Order::place(1, lines, Address::default(), 0);

        assert_eq!(order.total, 15_000);
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
