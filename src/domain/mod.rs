pub mod customer;
pub mod reading;

pub use customer::*;
pub use reading::*;
