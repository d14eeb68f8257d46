//! Decoding of contents API payloads.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::effects::RawFileContent;

use super::error::ContextError;

/// Decodes a contents API payload to text.
///
/// Returns `Ok(None)` for anything that isn't a regular file (directories,
/// symlinks, submodules), which callers treat the same as a 404. Base64
/// payloads arrive wrapped at 60 columns; all whitespace is ignored.
pub fn decode_content(raw: &RawFileContent) -> Result<Option<String>, ContextError> {
    if raw.kind != "file" {
        return Ok(None);
    }

    let content = raw.content.as_deref().unwrap_or_default();
    let bytes = match raw.encoding.as_deref() {
        Some("base64") => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            STANDARD.decode(compact).map_err(|e| ContextError::Decode {
                path: raw.path.clone(),
                reason: e.to_string(),
            })?
        }
        Some("utf-8") | Some("") | None => content.as_bytes().to_vec(),
        Some(other) => {
            return Err(ContextError::Decode {
                path: raw.path.clone(),
                reason: format!("unsupported content encoding `{}`", other),
            });
        }
    };

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|_| ContextError::Decode {
            path: raw.path.clone(),
            reason: "content is not valid UTF-8".to_string(),
        })
}
