pub mod block;
pub mod extract;
pub mod model;
pub mod source;

pub use block::{Block, RichNode, RichText};
pub use extract::{ExtractError, ExtractOptions, Extractor};
pub use model::{Element, Outline, Scenario, Table};
