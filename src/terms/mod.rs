// Ranked search terms
// Popularity store with a durable SQLite backend and an in-memory fallback

mod auth;
mod backend;
mod bridge;
mod clock;
mod durable;
mod moderation;
mod record;
mod service;
mod transient;

pub use auth::*;
pub use backend::*;
pub use bridge::*;
pub use clock::*;
pub use durable::*;
pub use moderation::*;
pub use record::*;
pub use service::*;
pub use transient::*;
