pub mod align;
pub mod converter;
pub mod error;

pub use align::align_tables;
pub use converter::{convert_to_gherkin, render_feature};
pub use error::ConversionError;
