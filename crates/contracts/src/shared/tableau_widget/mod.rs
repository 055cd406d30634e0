pub mod catalog;
pub mod config;
pub mod field;
pub mod filter;
pub mod response;
pub mod value;

pub use catalog::*;
pub use config::*;
pub use field::*;
pub use filter::*;
pub use response::*;
pub use value::*;
