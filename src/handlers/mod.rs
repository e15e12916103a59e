//! 핸들러 모듈

pub mod connection;
pub mod signaling;

pub use connection::*;
pub use signaling::*;
