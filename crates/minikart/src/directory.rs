use std::sync::Mutex;

use crate::{Account, DirectoryError, Result};

/// Store operations the member-ID allocator needs from an account backend.
///
/// The backing store is treated as a set of point operations: a live record
/// count, a per-identifier existence probe, a stable-order scan of records
/// lacking an identifier, and a persist. Implementations must be safe for
/// concurrent use. Use [`MemoryDirectory`] for in-memory storage
/// (testing/ephemeral).
pub trait AccountDirectory: Send + Sync {
    /// Returns the live count of all account records.
    fn count(&self) -> Result<u64>;

    /// Returns the live count of records already holding a member ID.
    fn assigned_count(&self) -> Result<u64>;

    /// Returns true if any record already holds `member_id`.
    fn member_id_taken(&self, member_id: &str) -> Result<bool>;

    /// Returns all accounts lacking a member ID, in stable key order.
    fn unlabeled(&self) -> Result<Vec<Account>>;

    /// Inserts the record under a fresh key, or overwrites it in place when
    /// it already has one.
    fn persist(&self, account: &mut Account) -> Result<()>;
}

/// In-memory [`AccountDirectory`] implementation.
/// Data is lost on restart. Suitable for testing or ephemeral use.
pub struct MemoryDirectory {
    inner: Mutex<MemoryDirectoryInner>,
}

struct MemoryDirectoryInner {
    accounts: Vec<Account>,
    next_key: u64,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryDirectoryInner {
                accounts: Vec::new(),
                next_key: 1,
            }),
        }
    }

    /// Returns a snapshot of every stored account, in key order.
    pub fn all(&self) -> Result<Vec<Account>> {
        let inner = self.lock()?;
        Ok(inner.accounts.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryDirectoryInner>> {
        self.inner.lock().map_err(|_| DirectoryError::Read {
            context: "account lock poisoned".into(),
        })
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountDirectory for MemoryDirectory {
    fn count(&self) -> Result<u64> {
        let inner = self.lock()?;
        Ok(inner.accounts.len() as u64)
    }

    fn assigned_count(&self) -> Result<u64> {
        let inner = self.lock()?;
        Ok(inner
            .accounts
            .iter()
            .filter(|a| a.member_id.is_some())
            .count() as u64)
    }

    fn member_id_taken(&self, member_id: &str) -> Result<bool> {
        let inner = self.lock()?;
        Ok(inner
            .accounts
            .iter()
            .any(|a| a.member_id.as_deref() == Some(member_id)))
    }

    fn unlabeled(&self) -> Result<Vec<Account>> {
        let inner = self.lock()?;
        Ok(inner
            .accounts
            .iter()
            .filter(|a| a.member_id.is_none())
            .cloned()
            .collect())
    }

    fn persist(&self, account: &mut Account) -> Result<()> {
        let mut inner = self.lock()?;
        match account.key {
            Some(key) => {
                let slot = inner
                    .accounts
                    .iter_mut()
                    .find(|a| a.key == Some(key))
                    .ok_or_else(|| DirectoryError::Write {
                        context: format!("no account under key {key}"),
                    })?;
                *slot = account.clone();
            }
            None => {
                account.key = Some(inner.next_key);
                inner.next_key += 1;
                inner.accounts.push(account.clone());
            }
        }
        Ok(())
    }
}
