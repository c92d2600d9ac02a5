pub mod message;
pub mod tag;

pub use message::*;
pub use tag::*;
