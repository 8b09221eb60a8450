//! Domain models.
//!
//! Row types decoded straight from Postgres plus the priced "view" types
//! returned by the API. Canonical prices are stored in USD; views carry
//! amounts converted into a display currency at the edge.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod inventory;
pub mod order;
pub mod review;
pub mod user;
pub mod wishlist;

pub use address::Address;
pub use cart::{CartItem, CartLine, CartLineView};
pub use catalog::{
    Category, CategoryNode, Product, ProductImage, ProductView, VariantStock, VariantView,
};
pub use inventory::Inventory;
pub use order::{Order, OrderItem, OrderStatusEntry, Payment};
pub use review::{Review, ReviewStats};
pub use user::User;
pub use wishlist::{WishlistEntry, WishlistEntryView, WishlistItem};
