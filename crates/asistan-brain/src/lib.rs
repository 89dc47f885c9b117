//! The assistant's orchestration layer: Telegram routing, handlers, storage
//! and the reminder poller.

pub mod brain;
pub mod service;
pub mod texts;

pub use brain::Brain;
pub use service::scheduler::ReminderPoller;
