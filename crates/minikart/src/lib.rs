#![doc = include_str!("../README.md")]

mod account;
mod allocator;
mod directory;
mod error;
mod time;

pub use crate::account::*;
pub use crate::allocator::*;
pub use crate::directory::*;
pub use crate::error::*;
pub use crate::time::*;

#[cfg(test)]
mod tests;
