//! Best-effort JSON extraction
//!
//! The advice service's model output is permitted to wrap its JSON payload in
//! surrounding prose or markdown. This module scans for the first balanced
//! object, respecting string literals and escapes, so `Sure! {...} Thanks`
//! parses the same as a bare object.

/// Extract the first balanced JSON object from `text`, if any.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            },
            _ => {},
        }
    }

    None
}
