pub mod orders;
pub mod products;

pub use orders::*;
pub use products::*;
