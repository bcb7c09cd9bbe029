pub mod dump;
pub mod mem;
pub mod page;
pub mod traits;

pub use mem::InMemoryStore;
pub use page::{Cursor, Keyed, Page};
pub use traits::*;
