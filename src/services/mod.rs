//! Storefront and admin operations, written against [`Store`](crate::store::Store)
//! so they run the same over PostgreSQL and in memory.

pub mod catalog;
pub mod orders;
pub mod placement;
