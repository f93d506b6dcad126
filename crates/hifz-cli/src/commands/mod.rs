pub mod init;
pub mod preview;
pub mod resolve;
pub mod validate;
