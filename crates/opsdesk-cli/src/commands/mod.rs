pub mod command;
pub mod migrate;
pub mod serve;
