use thiserror::Error;

/// Why an outline could not be converted. The `Display` text is the exact
/// body shown in place of the feature file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// No outline could be extracted from the page.
    #[error(
        "Error: Could not retrieve content from current page\n\n1. Ensure you're on a valid Notion page\n2. Refresh the page and try again"
    )]
    MissingContent,
    /// An outline was extracted but has no title, or neither background nor
    /// scenarios.
    #[error("Error: Content has invalid values\n\n")]
    InvalidContent,
}
