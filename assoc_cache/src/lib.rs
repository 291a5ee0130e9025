pub mod cache;
pub mod shape;
pub mod sim;
pub mod source;
pub mod stat;
