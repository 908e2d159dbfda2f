pub mod bundle;
pub mod config;
pub mod docs;
pub mod error;
pub mod io;
pub mod lint;
pub mod paths;
pub mod reload;
pub mod skills;
pub mod wizard;

pub use error::{Result, ScribeError};
