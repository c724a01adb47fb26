#![doc = include_str!("../README.md")]

mod error;
mod records;
mod store;

pub use crate::error::*;
pub use crate::records::*;
pub use crate::store::*;
