pub mod a1;
pub mod client;
pub mod types;

pub use client::{SheetStore, SheetsClient};
pub use types::PendingWrite;
