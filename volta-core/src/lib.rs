pub mod category;
pub mod notify;
pub mod order;
pub mod repository;
pub mod supplier;

pub use category::{Network, ServiceCategory};
pub use order::{Order, OrderStatus};
pub use supplier::SupplierId;
