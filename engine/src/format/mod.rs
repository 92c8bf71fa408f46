pub mod header;
pub mod payload;
