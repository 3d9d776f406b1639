pub mod nutrition;
pub mod prediction;

pub use nutrition::*;
pub use prediction::*;
