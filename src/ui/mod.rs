pub mod chat_view;
pub mod cli;
