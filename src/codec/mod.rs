// Codec module for the wirelite binary format

pub mod blob;
pub mod decode;
pub mod encode;
pub mod types;
pub mod varint;
