//! Ordered encoding fallback for text sources
//!
//! Spreadsheet exports from Windows tools arrive as UTF-8 (often with a BOM)
//! or as a legacy code page such as Big5. The chain tries each configured
//! encoding in order with strict decoding and returns the first success.

use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;

/// Encodings tried when nothing is configured
pub const DEFAULT_ENCODINGS: &[&str] = &["utf-8", "big5"];

/// Text successfully decoded by one of the chain's encodings
#[derive(Debug)]
pub struct Decoded<'a> {
    pub text: Cow<'a, str>,
    pub encoding: &'static Encoding,
}

/// Outcome of running the chain over a byte buffer
#[derive(Debug)]
pub enum DecodeOutcome<'a> {
    Decoded(Decoded<'a>),
    /// Every encoding rejected the input; names in the order they were tried
    Exhausted(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct EncodingChain {
    encodings: Vec<&'static Encoding>,
}

impl EncodingChain {
    /// Build a chain from WHATWG encoding labels.
    ///
    /// `utf-8-sig` is accepted as an alias for UTF-8; a BOM is always
    /// stripped regardless of the label. Returns the first unknown label as
    /// the error.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self, String> {
        let encodings = labels
            .iter()
            .map(|label| resolve_label(label.as_ref()).ok_or_else(|| label.as_ref().to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { encodings })
    }

    pub fn names(&self) -> Vec<String> {
        self.encodings.iter().map(|e| e.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.encodings.is_empty()
    }

    pub fn decode<'a>(&self, bytes: &'a [u8]) -> DecodeOutcome<'a> {
        self.encodings
            .iter()
            .find_map(|&encoding| {
                encoding
                    .decode_without_bom_handling_and_without_replacement(strip_bom(encoding, bytes))
                    .map(|text| Decoded { text, encoding })
            })
            .map_or_else(|| DecodeOutcome::Exhausted(self.names()), DecodeOutcome::Decoded)
    }
}

impl Default for EncodingChain {
    fn default() -> Self {
        // Every default label is known to encoding_rs
        Self {
            encodings: DEFAULT_ENCODINGS
                .iter()
                .filter_map(|label| resolve_label(label))
                .collect(),
        }
    }
}

fn resolve_label(label: &str) -> Option<&'static Encoding> {
    match label.trim().to_ascii_lowercase().as_str() {
        "utf-8-sig" | "utf8-sig" => Some(UTF_8),
        other => Encoding::for_label(other.as_bytes()),
    }
}

fn strip_bom<'a>(encoding: &'static Encoding, bytes: &'a [u8]) -> &'a [u8] {
    match Encoding::for_bom(bytes) {
        Some((bom_encoding, length)) if bom_encoding == encoding => &bytes[length..],
        _ => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // "遠百" encoded as Big5
    const BIG5_FAR_EASTERN: &[u8] = &[0xBB, 0xB7, 0xA6, 0xCA];

    #[test]
    fn test_default_chain_is_utf8_then_big5() {
        assert_eq!(EncodingChain::default().names(), vec!["UTF-8", "Big5"]);
    }

    #[test]
    fn test_utf8_bom_is_stripped() {
        let bytes = b"\xEF\xBB\xBFlocation,floor";
        match EncodingChain::default().decode(bytes) {
            DecodeOutcome::Decoded(decoded) => {
                assert_eq!(decoded.text, "location,floor");
                assert_eq!(decoded.encoding, UTF_8);
            },
            DecodeOutcome::Exhausted(tried) => panic!("unexpected failure: {:?}", tried),
        }
    }

    #[test]
    fn test_falls_back_to_big5() {
        match EncodingChain::default().decode(BIG5_FAR_EASTERN) {
            DecodeOutcome::Decoded(decoded) => {
                assert_eq!(decoded.text, "遠百");
                assert_eq!(decoded.encoding.name(), "Big5");
            },
            DecodeOutcome::Exhausted(tried) => panic!("unexpected failure: {:?}", tried),
        }
    }

    #[test]
    fn test_exhausted_reports_tried_encodings() {
        let chain = EncodingChain::from_labels(&["utf-8"]).unwrap_or_default();
        match chain.decode(BIG5_FAR_EASTERN) {
            DecodeOutcome::Exhausted(tried) => assert_eq!(tried, vec!["UTF-8"]),
            DecodeOutcome::Decoded(_) => panic!("Big5 bytes must not decode as UTF-8"),
        }
    }

    #[test]
    fn test_utf8_sig_alias() {
        let chain = EncodingChain::from_labels(&["UTF-8-SIG", "big5-hkscs"]);
        assert!(chain.is_ok());
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let err = EncodingChain::from_labels(&["utf-8", "klingon"]).unwrap_err();
        assert_eq!(err, "klingon");
    }
}
