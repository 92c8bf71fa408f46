pub mod atomic;
pub mod bytes;
