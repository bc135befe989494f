//! Database Models

pub mod delivery_agent;
pub mod order;
pub mod product;
pub mod shop;

pub use delivery_agent::DeliveryAgent;
pub use order::{
    CancelActor, CartLineInput, CheckoutRequest, CustomerInput, CustomerSnapshot, GeoPoint, Order,
    OrderLine, OrderStatus, OrderView, PaymentInfo, PaymentKind, PaymentStatus, parse_ref,
};
pub use product::Product;
pub use shop::Shop;
