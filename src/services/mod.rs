pub mod catalog;
pub mod discounts;
pub mod orders;
pub mod pricing;
pub mod reorder;
