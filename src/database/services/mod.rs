mod chat;
mod history;
mod user;
