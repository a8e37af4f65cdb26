pub mod queue;
pub mod redis;

pub use self::queue::*;
pub use self::redis::*;
