pub mod archive;
pub mod catalog;
pub mod dto;
pub mod image;
pub mod sync;
