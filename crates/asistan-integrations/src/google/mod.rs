pub mod calendar;
pub mod oauth;

pub use calendar::{CalendarClient, CalendarEvent};
pub use oauth::GoogleAuth;
