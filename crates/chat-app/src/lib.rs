#![deny(unsafe_code)]

pub mod app;
pub mod attachments;
pub mod chat;
pub mod settings;
