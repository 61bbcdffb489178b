pub mod store;

pub use store::{CatalogCounters, CatalogStore, DropdownData, NewProduct, Product, ProductUpdate};
