pub mod traits;

pub use traits::{IndexStore, Table};
