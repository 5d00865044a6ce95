//! Cart and category services.
//!
//! `CartService` decides per call whether the server or the local store is
//! the source of truth, based on `AuthState`. `CategoryService` always goes
//! through the server. Both raise change events through a `ChangeNotifier`.

pub mod cart;
pub mod category;
pub mod error;

pub use cart::CartService;
pub use category::CategoryService;
pub use error::CartError;
