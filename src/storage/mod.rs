pub mod catalog;
pub mod database;
pub mod header;
pub mod page_store;
pub mod table_def;
pub mod usage_map;

pub const JET3_HEADER_SIZE: usize = 20;
pub const JET3_MAGIC: &[u8; JET3_HEADER_SIZE] = b"\x00\x01\x00\x00Standard Jet DB\x00";
