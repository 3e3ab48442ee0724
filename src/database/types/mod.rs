mod chat;
mod history;
mod user;

pub use chat::Chat;
pub use history::{HistoryEntry, UserStats};
pub use user::User;
