pub mod inventory;
pub mod material;
pub mod quote;
