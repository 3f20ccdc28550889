//! Books, styles, and preferences as JSON

use super::{DecodedBooks, DecodedStyles};
use crate::error::{Error, Result};
use crate::model::{AppPreferences, Book, BooklistStyle};
use serde_json::Value;

/// Encode styles to pretty JSON bytes
pub fn encode_styles(styles: &[BooklistStyle]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(styles)?)
}

/// Decode styles from a JSON array.
///
/// Element-tolerant like `decode_books`: an element that does not decode as
/// a style is dropped and counted, the rest of the array continues. A
/// payload that is not an array at all is a structural error.
pub fn decode_styles(data: &[u8]) -> Result<DecodedStyles> {
    let value: Value = serde_json::from_slice(data)
        .map_err(|e| Error::Import(format!("styles payload does not decode: {e}")))?;

    let Value::Array(elements) = value else {
        return Err(Error::Import("styles payload is not an array".to_string()));
    };

    let mut decoded = DecodedStyles::default();
    for element in elements {
        match serde_json::from_value::<BooklistStyle>(element) {
            Ok(style) if !style.uuid.is_empty() => decoded.styles.push(style),
            Ok(_) => {
                tracing::warn!("dropping style element without a uuid");
                decoded.failed += 1;
            }
            Err(e) => {
                tracing::warn!("dropping undecodable style element: {e}");
                decoded.failed += 1;
            }
        }
    }

    Ok(decoded)
}

/// Encode preferences to pretty JSON bytes
pub fn encode_preferences(prefs: &AppPreferences) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(prefs)?)
}

/// Decode preferences from JSON bytes
pub fn decode_preferences(data: &[u8]) -> Result<AppPreferences> {
    serde_json::from_slice(data)
        .map_err(|e| Error::Import(format!("preferences do not decode: {e}")))
}

/// Decode a batch of books from a JSON array.
///
/// Element-tolerant: an element that does not decode as a book is dropped
/// and counted, the rest of the array continues. A payload that is not an
/// array at all is a structural error.
pub fn decode_books(data: &[u8]) -> Result<DecodedBooks> {
    let value: Value = serde_json::from_slice(data)
        .map_err(|e| Error::Import(format!("books payload does not decode: {e}")))?;

    let Value::Array(elements) = value else {
        return Err(Error::Import("books payload is not an array".to_string()));
    };

    let mut decoded = DecodedBooks::default();
    for element in elements {
        match serde_json::from_value::<Book>(element) {
            Ok(book) if !book.uuid.is_empty() => decoded.books.push(book),
            Ok(_) => {
                tracing::warn!("dropping book element without a uuid");
                decoded.failed += 1;
            }
            Err(e) => {
                tracing::warn!("dropping undecodable book element: {e}");
                decoded.failed += 1;
            }
        }
    }

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles_roundtrip() {
        let mut style = BooklistStyle::new("Compact");
        style.settings.insert("rows".to_string(), "dense".to_string());
        let bytes = encode_styles(std::slice::from_ref(&style)).unwrap();
        let decoded = decode_styles(&bytes).unwrap();
        assert_eq!(decoded.failed, 0);
        assert_eq!(decoded.styles, vec![style]);
    }

    #[test]
    fn test_decode_styles_tolerates_bad_elements() {
        let json = r#"[{"uuid":"a","name":"Fine"}, 42, {"name":"no identity"}]"#;
        let decoded = decode_styles(json.as_bytes()).unwrap();
        assert_eq!(decoded.styles.len(), 1);
        assert_eq!(decoded.failed, 2);
    }

    #[test]
    fn test_non_array_styles_payload_is_structural() {
        assert!(decode_styles(br#"{"not":"an array"}"#).is_err());
    }

    #[test]
    fn test_decode_books_tolerates_bad_elements() {
        let json = r#"[{"uuid":"a","title":"Fine"}, 42, {"title":"no identity"}]"#;
        let decoded = decode_books(json.as_bytes()).unwrap();
        assert_eq!(decoded.books.len(), 1);
        assert_eq!(decoded.failed, 2);
    }

    #[test]
    fn test_non_array_books_payload_is_structural() {
        assert!(decode_books(br#"{"not":"an array"}"#).is_err());
    }

    #[test]
    fn test_preferences_roundtrip() {
        let mut prefs = AppPreferences::default();
        prefs.set("scanner.beep", "false");
        let bytes = encode_preferences(&prefs).unwrap();
        assert_eq!(decode_preferences(&bytes).unwrap(), prefs);
    }
}
