pub mod catalog;
pub mod cosmetics;
pub mod error;
pub mod store;
pub mod sync;
pub mod tracker;
