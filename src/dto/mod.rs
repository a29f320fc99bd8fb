pub mod cart;
pub mod orders;
pub mod products;
pub mod session;
