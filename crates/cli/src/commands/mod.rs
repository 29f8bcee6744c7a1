pub mod import;
pub mod migrate;
