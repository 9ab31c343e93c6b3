mod asset;
mod content;

pub use asset::*;
pub use content::*;
