pub mod diagnosis;
pub mod entry;
pub mod enums;
pub mod medication;
pub mod note;

pub use diagnosis::*;
pub use entry::*;
pub use enums::*;
pub use medication::*;
pub use note::*;
