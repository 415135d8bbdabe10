// src/application/service/mod.rs
// Application services shared by the use cases

pub mod cache;
pub mod request;

pub use cache::TtlCache;
pub use request::{RequestSlot, RequestToken};
