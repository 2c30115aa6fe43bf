mod issue;
mod models;
mod rating;

pub use issue::*;
pub use models::*;
pub use rating::*;
