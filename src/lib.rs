pub mod config;
pub mod dataset;
pub mod fetch;
pub mod geo;
pub mod layout;
pub mod output;
pub mod parser;
pub mod publish;
pub mod route;
pub mod selection;
pub mod stats;
