pub mod config;
pub mod map;
pub mod messages;
pub mod robot;
pub mod speed;

pub use config::*;
pub use map::*;
pub use messages::*;
pub use robot::*;
pub use speed::*;
