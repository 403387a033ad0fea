//! Query string and form body codec.
//!
//! Decodes `application/x-www-form-urlencoded` data into an ordered
//! [`Parameters`] map and encodes it back.

use thiserror::Error;
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated percent escape at byte {0}")]
    TruncatedEscape(usize),
    #[error("invalid hex digit in percent escape at byte {0}")]
    InvalidEscape(usize),
}

/// Ordered string→string mapping.
///
/// Inserting an existing key replaces its value but keeps the key's
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    entries: Vec<(String, String)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merges `other` into `self`; keys from `other` win.
    pub fn extend(&mut self, other: Parameters) {
        for (k, v) in other.entries {
            self.insert(k, v);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Parameters::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Decodes `a=1&b=two%20words` into an ordered map.
///
/// Tokens without `=` are skipped. Keys are trimmed before decoding.
pub fn decode(encoded: &str) -> Result<Parameters, DecodeError> {
    let mut params = Parameters::new();
    for token in encoded.split('&') {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        params.insert(percent_decode(key.trim())?, percent_decode(value)?);
    }
    Ok(params)
}

/// Replaces `+` with a space and `%XX` with the byte it names.
///
/// Byte sequences that are not UTF-8 become U+FFFD.
pub fn percent_decode(s: &str) -> Result<String, DecodeError> {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            b'%' => {
                if i + 2 >= bytes.len() {
                    return Err(DecodeError::TruncatedEscape(i));
                }
                let hi = hex_value(bytes[i + 1]).ok_or(DecodeError::InvalidEscape(i))?;
                let lo = hex_value(bytes[i + 2]).ok_or(DecodeError::InvalidEscape(i))?;
                decoded.push((hi << 4) | lo);
                i += 3;
            }
            b => {
                decoded.push(b);
                i += 1;
            }
        }
    }
    Ok(String::from_utf8_lossy(&decoded).into_owned())
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Encodes every pair as UTF-8 form data joined with `&`.
pub fn encode(params: &Parameters) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

/// Percent-encodes each `/`-separated segment of a path, spaces as `%20`.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| form_urlencoded::byte_serialize(segment.as_bytes()).collect::<String>())
        .map(|segment| segment.replace('+', "%20"))
        .collect::<Vec<_>>()
        .join("/")
}
