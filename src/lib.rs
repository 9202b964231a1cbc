pub mod aggregate;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod updates;
