pub mod reload;
pub mod skills;
pub mod wizard;
