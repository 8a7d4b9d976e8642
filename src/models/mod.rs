pub mod history;
pub mod performance;
pub mod preferences;
pub mod product;
pub mod recommendation;

pub use history::*;
pub use performance::*;
pub use preferences::*;
pub use product::*;
pub use recommendation::*;
