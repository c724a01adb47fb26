use serde::{Deserialize, Serialize};

/// Storefront roles. Admins may update order status and see foreign orders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// A stored account document.
///
/// `key` is the opaque unique key assigned by the store on first persist.
/// `member_id` is the short human-readable identifier minted by
/// [`MemberIdAllocator`]; it is write-once and globally unique across all
/// account records once assigned.
///
/// [`MemberIdAllocator`]: crate::MemberIdAllocator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    /// Store-assigned key; `None` until the record is first persisted.
    pub key: Option<u64>,

    /// Short member identifier, e.g. `MK001`. Write-once.
    pub member_id: Option<String>,

    pub name: String,
    pub email: String,
    pub password_hash: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub profile_image: String,

    #[serde(default)]
    pub role: Role,

    /// Unix millis at creation.
    pub created_at: u64,

    /// Unix millis of the last profile update.
    pub updated_at: u64,
}

impl Account {
    /// Builds a fresh, unpersisted account with the default `user` role.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        now_millis: u64,
    ) -> Self {
        Self {
            key: None,
            member_id: None,
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            phone: None,
            profile_image: String::new(),
            role: Role::User,
            created_at: now_millis,
            updated_at: now_millis,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
