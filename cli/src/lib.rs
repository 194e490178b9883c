//! streamcast-cli library: command handlers and the HTTP control panel, exposed for tests.

pub mod app;
pub mod commands;
pub mod http;
