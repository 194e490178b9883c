pub mod cli;
pub mod maintenance;
pub mod stream;
