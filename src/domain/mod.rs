pub mod contacts;
pub mod push;
