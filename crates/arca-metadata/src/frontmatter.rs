//! Front-matter extraction.
//!
//! An artifact descriptor is a markdown file whose metadata lives in a YAML
//! block fenced by `---` lines at the top of the file. Blank lines before
//! the opening fence are allowed; anything else means the file has no
//! front matter.

use thiserror::Error;

const DELIMITER: &str = "---";

/// Why front matter could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontMatterError {
    /// The first non-blank line is not an opening fence.
    #[error("this file has no front matter")]
    Missing,
    /// The opening fence has no matching closing fence.
    #[error("front matter is not terminated by a closing `---`")]
    Unterminated,
}

fn is_delimiter(line: &str) -> bool {
    line.starts_with(DELIMITER) && line.trim() == DELIMITER
}

/// Return the YAML text between the opening and closing fences, with each
/// line newline-terminated.
pub fn extract(text: &str) -> Result<String, FrontMatterError> {
    let mut lines = text.lines();

    loop {
        match lines.next() {
            Some(line) if line.trim().is_empty() => continue,
            Some(line) if is_delimiter(line) => break,
            _ => return Err(FrontMatterError::Missing),
        }
    }

    let mut block = String::new();
    for line in lines {
        if is_delimiter(line) {
            return Ok(block);
        }
        block.push_str(line);
        block.push('\n');
    }

    Err(FrontMatterError::Unterminated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_block_between_fences() {
        let text = "---\ntitle: A\nversion: 1\n---\n\n# Body\n";
        assert_eq!(extract(text).unwrap(), "title: A\nversion: 1\n");
    }

    #[test]
    fn leading_blank_lines_are_allowed() {
        let text = "\n   \n---\nversion: 1\n---\n";
        assert_eq!(extract(text).unwrap(), "version: 1\n");
    }

    #[test]
    fn text_before_fence_means_no_front_matter() {
        assert_eq!(
            extract("# Heading\n---\nversion: 1\n---\n"),
            Err(FrontMatterError::Missing)
        );
        assert_eq!(extract(""), Err(FrontMatterError::Missing));
    }

    #[test]
    fn fence_must_be_exactly_three_dashes() {
        assert_eq!(extract("----\nversion: 1\n----\n"), Err(FrontMatterError::Missing));
        assert_eq!(extract(" ---\nversion: 1\n---\n"), Err(FrontMatterError::Missing));
        // Trailing whitespace after the fence is tolerated.
        assert_eq!(extract("---  \nversion: 1\n---\t\n").unwrap(), "version: 1\n");
    }

    #[test]
    fn unterminated_block_is_an_error() {
        assert_eq!(
            extract("---\nversion: 1\n"),
            Err(FrontMatterError::Unterminated)
        );
    }

    #[test]
    fn crlf_line_endings_are_handled() {
        assert_eq!(extract("---\r\nversion: 1\r\n---\r\n").unwrap(), "version: 1\n");
    }
}
