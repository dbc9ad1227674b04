//! YAML front matter.

use crate::DocumentError;

/// Front matter fence.
const FENCE: &str = "---";

/// Source split into front matter and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    /// Front matter, `Null` when the source has none.
    pub data: serde_yaml::Value,
    /// Everything after the closing fence.
    pub content: String,
}

impl Parsed {
    /// Front matter as JSON.
    ///
    /// # Errors
    ///
    /// Fails for YAML that has no JSON equivalent, such as non-string keys.
    pub fn data_json(&self) -> Result<serde_json::Value, DocumentError> {
        Ok(serde_json::to_value(&self.data)?)
    }
}

/// Front matter extractor.
pub struct FrontMatter;

impl FrontMatter {
    /// Split a leading `---` fenced YAML block off `text`.
    ///
    /// Text that does not open with a fence line is returned whole with
    /// `Null` data.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::UnterminatedFrontMatter`] when the closing
    /// fence is missing and [`DocumentError::FrontMatter`] for invalid YAML.
    pub fn extract(text: &str) -> Result<Parsed, DocumentError> {
        let Some(body) = strip_fence_line(text) else {
            return Ok(Parsed {
                data: serde_yaml::Value::Null,
                content: text.to_owned(),
            });
        };

        let mut offset = 0;
        for line in body.split_inclusive('\n') {
            if line.trim_end_matches(['\n', '\r']) == FENCE {
                let yaml = &body[..offset];
                let content = body[offset + line.len()..].to_owned();
                let data = if yaml.trim().is_empty() {
                    serde_yaml::Value::Null
                } else {
                    serde_yaml::from_str(yaml)?
                };
                tracing::debug!(bytes = yaml.len(), "Extracted front matter");
                return Ok(Parsed { data, content });
            }
            offset += line.len();
        }
        Err(DocumentError::UnterminatedFrontMatter)
    }
}

/// Text after an opening fence line, if `text` starts with one.
fn strip_fence_line(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(FENCE)?;
    rest.strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_front_matter() {
        let parsed = FrontMatter::extract("---\ntitle: Hello\ntags: [a, b]\n---\n# Body\n").unwrap();
        assert_eq!(parsed.data["title"].as_str(), Some("Hello"));
        assert_eq!(parsed.data["tags"][1].as_str(), Some("b"));
        assert_eq!(parsed.content, "# Body\n");
    }

    #[test]
    fn test_no_front_matter() {
        let parsed = FrontMatter::extract("# Title\n---\n").unwrap();
        assert!(parsed.data.is_null());
        assert_eq!(parsed.content, "# Title\n");
    }

    #[test]
    fn test_fence_needs_own_line() {
        let parsed = FrontMatter::extract("--- not yaml\n").unwrap();
        assert!(parsed.data.is_null());
        assert_eq!(parsed.content, "--- not yaml\n");
    }

    #[test]
    fn test_empty_front_matter() {
        let parsed = FrontMatter::extract("---\n---\nbody").unwrap();
        assert!(parsed.data.is_null());
        assert_eq!(parsed.content, "body");
    }

    #[test]
    fn test_crlf_fences() {
        let parsed = FrontMatter::extract("---\r\na: 1\r\n---\r\nbody").unwrap();
        assert_eq!(parsed.data["a"].as_i64(), Some(1));
        assert_eq!(parsed.content, "body");
    }

    #[test]
    fn test_unterminated() {
        let err = FrontMatter::extract("---\ntitle: x\n").unwrap_err();
        assert!(matches!(err, DocumentError::UnterminatedFrontMatter));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = FrontMatter::extract("---\ntitle: [oops\n---\n").unwrap_err();
        assert!(matches!(err, DocumentError::FrontMatter(_)));
    }

    #[test]
    fn test_data_json() {
        let parsed = FrontMatter::extract("---\ntitle: Hi\ncount: 2\n---\n").unwrap();
        assert_eq!(
            parsed.data_json().unwrap(),
            serde_json::json!({"title": "Hi", "count": 2})
        );
    }
}
