pub mod types;

use crate::error::{Error, Result};
use types::FrontMatter;

/// Structural marker opening and closing the YAML header.
pub const DELIMITER: &str = "---";

/// Codec between raw note content and (front matter, body).
pub struct FrontMatterCodec;

impl FrontMatterCodec {
    /// Split note content into parsed front matter and trimmed body.
    ///
    /// Content must begin with `---`; the first two markers delimit the
    /// header, everything after the second belongs to the body even if it
    /// contains further `---` sequences.
    pub fn parse(content: &str) -> Result<(FrontMatter, String)> {
        if !content.starts_with(DELIMITER) {
            return Err(Error::MalformedData("front matter not found".to_string()));
        }

        let mut parts = content.splitn(3, DELIMITER);
        parts.next();
        let header = parts.next();
        let body = parts.next();

        let (header, body) = match (header, body) {
            (Some(header), Some(body)) => (header, body),
            _ => return Err(Error::MalformedData("invalid front matter format".to_string())),
        };

        let front_matter: FrontMatter = serde_yaml::from_str(header.trim())
            .map_err(|e| Error::MalformedData(format!("failed to parse front matter: {}", e)))?;

        Ok((front_matter, body.trim().to_string()))
    }

    /// Render front matter and body back into note content:
    /// `---`, the YAML header in canonical key order, `---`, a blank
    /// line, then the body.
    pub fn serialize(front_matter: &FrontMatter, body: &str) -> Result<String> {
        let yaml = serde_yaml::to_string(front_matter)?;
        Ok(format!("---\n{}---\n\n{}", yaml, body))
    }
}
