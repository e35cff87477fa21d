pub mod flag;
pub mod manifest;
pub mod session;
