//! Domain models for the storefront.
//!
//! - [`session`] - the signed-in identity
//! - [`cart`] - cart lines and the pure cart operations the cart store persists

pub mod cart;
pub mod session;

pub use cart::{Cart, CartEvent, CartLine, CartState};
pub use session::{Session, SessionEvent};
