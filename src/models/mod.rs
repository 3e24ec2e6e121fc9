//! Domain models shared by the store, the services and the HTTP layer

mod booking;
mod engagement;
mod property;
mod user;

pub use booking::*;
pub use engagement::*;
pub use property::*;
pub use user::*;
