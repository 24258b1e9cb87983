pub mod engine;
pub mod error;
pub mod models;
pub mod normalize;
pub mod store;

pub use engine::*;
pub use error::*;
pub use models::*;
pub use normalize::*;
pub use store::*;
