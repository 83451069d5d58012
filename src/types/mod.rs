mod error;
mod limit;
mod plan;
mod usage;

pub use error::*;
pub use limit::*;
pub use plan::*;
pub use usage::*;
