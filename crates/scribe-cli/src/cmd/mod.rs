pub mod bundle;
pub mod config;
pub mod init;
pub mod lint;
pub mod skills;
pub mod wizard;
