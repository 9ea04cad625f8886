pub mod activity;
pub mod defra;
pub mod emit;
pub mod food;
pub mod slug;
