//! Permissive JSON: `//` and `/* */` comments and trailing commas are accepted.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CoreError, CoreErrorCode};

pub fn parse_str(raw: &str) -> Result<Value, CoreError> {
    from_str(raw)
}

pub fn from_str<T: DeserializeOwned>(raw: &str) -> Result<T, CoreError> {
    let cleaned = strip(raw);
    serde_json::from_str(&cleaned).map_err(|e| CoreError::new(CoreErrorCode::Parse, e.to_string()))
}

pub fn read_file(path: &Path) -> Result<Value, CoreError> {
    read_file_as(path)
}

pub fn read_file_as<T: DeserializeOwned>(path: &Path) -> Result<T, CoreError> {
    let raw = fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
    from_str(&raw).map_err(|e| {
        CoreError::new(e.code, format!("failed to parse {}: {}", path.display(), e.message))
    })
}

/// Rewrites `raw` into strict JSON. String literals are copied verbatim.
fn strip(raw: &str) -> String {
    let src = raw.strip_prefix('\u{feff}').unwrap_or(raw).as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(src.len());
    let mut cursor = 0usize;

    while cursor < src.len() {
        match src[cursor] {
            b'"' => {
                let start = cursor;
                cursor += 1;
                while cursor < src.len() && src[cursor] != b'"' {
                    if src[cursor] == b'\\' {
                        cursor += 1;
                    }
                    cursor += 1;
                }
                cursor = (cursor + 1).min(src.len());
                out.extend_from_slice(&src[start..cursor]);
            }
            b'/' if src.get(cursor + 1) == Some(&b'/') => {
                while cursor < src.len() && src[cursor] != b'\n' {
                    cursor += 1;
                }
            }
            b'/' if src.get(cursor + 1) == Some(&b'*') => {
                cursor += 2;
                while cursor < src.len()
                    && !(src[cursor] == b'*' && src.get(cursor + 1) == Some(&b'/'))
                {
                    cursor += 1;
                }
                cursor = (cursor + 2).min(src.len());
                out.push(b' ');
            }
            b'}' | b']' => {
                drop_trailing_comma(&mut out);
                out.push(src[cursor]);
                cursor += 1;
            }
            other => {
                out.push(other);
                cursor += 1;
            }
        }
    }

    // Only ASCII bytes were removed or inserted, so UTF-8 boundaries are intact.
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn drop_trailing_comma(out: &mut Vec<u8>) {
    let Some(pos) = out.iter().rposition(|b| !b.is_ascii_whitespace()) else {
        return;
    };
    if out[pos] == b',' {
        out.remove(pos);
    }
}
