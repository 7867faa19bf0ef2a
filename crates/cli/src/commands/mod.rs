pub mod ask;
pub mod auth;
pub mod chat;
pub mod doctor;
pub mod init;
pub mod runtime;
pub mod serve;
pub mod tools;
