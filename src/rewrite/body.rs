//! Text views of fetched bodies that survive a rewrite unchanged
//!
//! Pages and stylesheets are rewritten as text, but not every server sends UTF-8.
//! A body that is not valid UTF-8 is read one byte per character (ISO-8859-1), which
//! never fails and maps back to exactly the same bytes. Markup and `url(...)` syntax
//! are ASCII in every such encoding, so references are found either way.

/// A fetched body decoded for rewriting
#[derive(Debug, Clone)]
pub struct BodyText {
    text: String,
    single_byte: bool,
}

impl BodyText {
    /// Decodes `bytes` as UTF-8, or byte for byte when that fails
    pub fn decode(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self {
                text,
                single_byte: false,
            },
            Err(err) => Self {
                text: err.into_bytes().into_iter().map(char::from).collect(),
                single_byte: true,
            },
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns true when the body was not valid UTF-8
    pub fn is_single_byte(&self) -> bool {
        self.single_byte
    }

    /// Returns the original bytes
    pub fn into_bytes(self) -> Vec<u8> {
        if self.single_byte {
            latin1_bytes(&self.text).unwrap_or_else(|| self.text.into_bytes())
        } else {
            self.text.into_bytes()
        }
    }

    /// Encodes rewritten text the same way the body was decoded
    ///
    /// Falls back to UTF-8 if the rewrite introduced a character outside Latin-1.
    pub fn encode(&self, rewritten: String) -> Vec<u8> {
        if self.single_byte {
            if let Some(bytes) = latin1_bytes(&rewritten) {
                return bytes;
            }
        }
        rewritten.into_bytes()
    }
}

fn latin1_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}
