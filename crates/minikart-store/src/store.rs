use std::path::Path;

use minikart::{Account, AccountDirectory, DirectoryError};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Serialize, de::DeserializeOwned};

use crate::{Cart, Order, Product, StoreError, StoreResult};

const ACCOUNTS: TableDefinition<u64, &[u8]> = TableDefinition::new("accounts");
const PRODUCTS: TableDefinition<u64, &[u8]> = TableDefinition::new("products");
const CARTS: TableDefinition<u64, &[u8]> = TableDefinition::new("carts");
const ORDERS: TableDefinition<u64, &[u8]> = TableDefinition::new("orders");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_KEY: &str = "next_key";

fn storage<E: std::fmt::Display>(err: E) -> StoreError {
    StoreError::Storage(err.to_string())
}

fn codec(err: serde_json::Error) -> StoreError {
    StoreError::Serialization(err.to_string())
}

/// A document stored under a store-assigned `u64` key.
trait Document: Serialize + DeserializeOwned {
    fn key(&self) -> Option<u64>;
    fn set_key(&mut self, key: u64);
}

impl Document for Account {
    fn key(&self) -> Option<u64> {
        self.key
    }
    fn set_key(&mut self, key: u64) {
        self.key = Some(key);
    }
}

impl Document for Product {
    fn key(&self) -> Option<u64> {
        self.key
    }
    fn set_key(&mut self, key: u64) {
        self.key = Some(key);
    }
}

impl Document for Cart {
    fn key(&self) -> Option<u64> {
        self.key
    }
    fn set_key(&mut self, key: u64) {
        self.key = Some(key);
    }
}

impl Document for Order {
    fn key(&self) -> Option<u64> {
        self.key
    }
    fn set_key(&mut self, key: u64) {
        self.key = Some(key);
    }
}

/// Persistent document store backed by redb.
///
/// One table per collection, values serialized as JSON. Keys are assigned
/// from a single monotonic sequence shared by every collection, so a key
/// identifies a document globally. Scans iterate in key order.
pub struct Store {
    db: Database,
}

impl Store {
    /// Opens or creates a store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = Database::create(path).map_err(storage)?;

        // Create the tables if they don't exist
        let tx = db.begin_write().map_err(storage)?;
        {
            let _ = tx.open_table(ACCOUNTS).map_err(storage)?;
            let _ = tx.open_table(PRODUCTS).map_err(storage)?;
            let _ = tx.open_table(CARTS).map_err(storage)?;
            let _ = tx.open_table(ORDERS).map_err(storage)?;
            let _ = tx.open_table(META).map_err(storage)?;
        }
        tx.commit().map_err(storage)?;

        Ok(Self { db })
    }

    fn persist_in<T: Document>(
        &self,
        table: TableDefinition<u64, &[u8]>,
        doc: &mut T,
    ) -> StoreResult<()> {
        let tx = self.db.begin_write().map_err(storage)?;
        {
            let key = match doc.key() {
                Some(key) => key,
                None => {
                    let mut meta = tx.open_table(META).map_err(storage)?;
                    let next = meta
                        .get(NEXT_KEY)
                        .map_err(storage)?
                        .map(|g| g.value())
                        .unwrap_or(1);
                    meta.insert(NEXT_KEY, next + 1).map_err(storage)?;
                    doc.set_key(next);
                    next
                }
            };
            let bytes = serde_json::to_vec(doc).map_err(codec)?;
            let mut table = tx.open_table(table).map_err(storage)?;
            table.insert(key, bytes.as_slice()).map_err(storage)?;
        }
        tx.commit().map_err(storage)
    }

    fn get_in<T: Document>(
        &self,
        table: TableDefinition<u64, &[u8]>,
        key: u64,
    ) -> StoreResult<Option<T>> {
        let tx = self.db.begin_read().map_err(storage)?;
        let table = tx.open_table(table).map_err(storage)?;

        match table.get(key).map_err(storage)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value()).map_err(codec)?)),
            None => Ok(None),
        }
    }

    fn scan_in<T: Document>(&self, table: TableDefinition<u64, &[u8]>) -> StoreResult<Vec<T>> {
        let tx = self.db.begin_read().map_err(storage)?;
        let table = tx.open_table(table).map_err(storage)?;

        let mut docs = Vec::new();
        for entry in table.iter().map_err(storage)? {
            let (_, value) = entry.map_err(storage)?;
            docs.push(serde_json::from_slice(value.value()).map_err(codec)?);
        }
        Ok(docs)
    }

    fn len_of(&self, table: TableDefinition<u64, &[u8]>) -> StoreResult<u64> {
        let tx = self.db.begin_read().map_err(storage)?;
        let table = tx.open_table(table).map_err(storage)?;
        table.len().map_err(storage)
    }

    // --- accounts ---

    pub fn persist_account(&self, account: &mut Account) -> StoreResult<()> {
        self.persist_in(ACCOUNTS, account)
    }

    pub fn account(&self, key: u64) -> StoreResult<Option<Account>> {
        self.get_in(ACCOUNTS, key)
    }

    /// All accounts, in key order.
    pub fn accounts(&self) -> StoreResult<Vec<Account>> {
        self.scan_in(ACCOUNTS)
    }

    pub fn account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self.accounts()?.into_iter().find(|a| a.email == email))
    }

    pub fn account_by_member_id(&self, member_id: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .accounts()?
            .into_iter()
            .find(|a| a.member_id.as_deref() == Some(member_id)))
    }

    pub fn account_count(&self) -> StoreResult<u64> {
        self.len_of(ACCOUNTS)
    }

    // --- products ---

    pub fn persist_product(&self, product: &mut Product) -> StoreResult<()> {
        self.persist_in(PRODUCTS, product)
    }

    pub fn product(&self, key: u64) -> StoreResult<Option<Product>> {
        self.get_in(PRODUCTS, key)
    }

    /// The full catalog, in key order.
    pub fn products(&self) -> StoreResult<Vec<Product>> {
        self.scan_in(PRODUCTS)
    }

    /// Replaces the whole catalog, assigning fresh keys. Used by seeding.
    pub fn replace_products(&self, products: Vec<Product>) -> StoreResult<Vec<Product>> {
        let tx = self.db.begin_write().map_err(storage)?;
        let mut out = Vec::with_capacity(products.len());
        {
            tx.delete_table(PRODUCTS).map_err(storage)?;
            let mut table = tx.open_table(PRODUCTS).map_err(storage)?;
            let mut meta = tx.open_table(META).map_err(storage)?;

            for mut product in products {
                let next = meta
                    .get(NEXT_KEY)
                    .map_err(storage)?
                    .map(|g| g.value())
                    .unwrap_or(1);
                meta.insert(NEXT_KEY, next + 1).map_err(storage)?;
                product.key = Some(next);

                let bytes = serde_json::to_vec(&product).map_err(codec)?;
                table.insert(next, bytes.as_slice()).map_err(storage)?;
                out.push(product);
            }
        }
        tx.commit().map_err(storage)?;
        Ok(out)
    }

    // --- carts ---

    pub fn persist_cart(&self, cart: &mut Cart) -> StoreResult<()> {
        self.persist_in(CARTS, cart)
    }

    pub fn cart_for(&self, account: u64) -> StoreResult<Option<Cart>> {
        Ok(self
            .scan_in::<Cart>(CARTS)?
            .into_iter()
            .find(|c| c.account == account))
    }

    /// Drops every cart. Used by seeding.
    pub fn clear_carts(&self) -> StoreResult<()> {
        let tx = self.db.begin_write().map_err(storage)?;
        {
            tx.delete_table(CARTS).map_err(storage)?;
            let _ = tx.open_table(CARTS).map_err(storage)?;
        }
        tx.commit().map_err(storage)
    }

    // --- orders ---

    pub fn persist_order(&self, order: &mut Order) -> StoreResult<()> {
        self.persist_in(ORDERS, order)
    }

    pub fn order(&self, key: u64) -> StoreResult<Option<Order>> {
        self.get_in(ORDERS, key)
    }

    /// Orders placed by one account, in key order.
    pub fn orders_for(&self, account: u64) -> StoreResult<Vec<Order>> {
        Ok(self
            .scan_in::<Order>(ORDERS)?
            .into_iter()
            .filter(|o| o.account == account)
            .collect())
    }
}

fn read_error(err: StoreError) -> DirectoryError {
    DirectoryError::Read {
        context: err.to_string(),
    }
}

fn write_error(err: StoreError) -> DirectoryError {
    DirectoryError::Write {
        context: err.to_string(),
    }
}

impl AccountDirectory for Store {
    fn count(&self) -> minikart::Result<u64> {
        self.account_count().map_err(read_error)
    }

    fn assigned_count(&self) -> minikart::Result<u64> {
        let accounts = self.accounts().map_err(read_error)?;
        Ok(accounts.iter().filter(|a| a.member_id.is_some()).count() as u64)
    }

    fn member_id_taken(&self, member_id: &str) -> minikart::Result<bool> {
        Ok(self
            .account_by_member_id(member_id)
            .map_err(read_error)?
            .is_some())
    }

    fn unlabeled(&self) -> minikart::Result<Vec<Account>> {
        let accounts = self.accounts().map_err(read_error)?;
        Ok(accounts
            .into_iter()
            .filter(|a| a.member_id.is_none())
            .collect())
    }

    fn persist(&self, account: &mut Account) -> minikart::Result<()> {
        self.persist_account(account).map_err(write_error)
    }
}
