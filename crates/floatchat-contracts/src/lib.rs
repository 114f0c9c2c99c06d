pub mod chat;
pub mod extract;
pub mod intent;
pub mod models;
pub mod records;
pub mod regions;
