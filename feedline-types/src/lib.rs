pub mod enums;
pub mod models;
pub mod patch;

pub use enums::*;
pub use models::*;
pub use patch::*;
