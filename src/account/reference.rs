//! Opaque contact-record references for verification URLs.
//!
//! A reference encodes `(kind, id)` reversibly; it carries no authority of
//! its own — the verification token does. The payload is the five-character
//! kind tag glued to the decimal record id, base64url-encoded without
//! padding.

use base64ct::{Base64UrlUnpadded, Encoding};

use crate::account::error::ReferenceError;
use crate::account::models::ContactKind;

const KIND_TAG_LEN: usize = 5;

/// Encode a record reference for use inside a URL path segment.
#[must_use]
pub fn encode_reference(kind: ContactKind, id: i64) -> String {
    Base64UrlUnpadded::encode_string(format!("{}{id}", kind.tag()).as_bytes())
}

/// Decode a reference back into `(kind, id)`.
///
/// # Errors
/// Any malformed input — bad base64, non-UTF-8 payload, missing id, unknown
/// kind tag, non-numeric or negative id — is an error; nothing panics.
pub fn decode_reference(encoded: &str) -> Result<(ContactKind, i64), ReferenceError> {
    let bytes =
        Base64UrlUnpadded::decode_vec(encoded).map_err(|_| ReferenceError::Base64)?;

    if bytes.len() <= KIND_TAG_LEN {
        return Err(ReferenceError::TooShort);
    }
    let (tag_bytes, id_bytes) = bytes.split_at(KIND_TAG_LEN);

    let tag = std::str::from_utf8(tag_bytes).map_err(|_| ReferenceError::Utf8)?;
    let kind = ContactKind::from_tag(tag).ok_or(ReferenceError::UnknownKind)?;

    let id = std::str::from_utf8(id_bytes)
        .map_err(|_| ReferenceError::Utf8)?
        .parse::<i64>()
        .map_err(|_| ReferenceError::InvalidId)?;
    if id < 0 {
        return Err(ReferenceError::InvalidId);
    }

    Ok((kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_all_kinds() {
        for kind in [ContactKind::Phone, ContactKind::Email] {
            for id in [0, 1, 42, i64::MAX] {
                let encoded = encode_reference(kind, id);
                assert_eq!(decode_reference(&encoded), Ok((kind, id)));
            }
        }
    }

    #[test]
    fn encoded_form_is_url_safe() {
        let encoded = encode_reference(ContactKind::Email, 42);
        assert!(encoded
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
    }

    #[test]
    fn rejects_bad_base64() {
        assert_eq!(decode_reference("not-base64!!"), Err(ReferenceError::Base64));
        assert_eq!(decode_reference(""), Err(ReferenceError::TooShort));
    }

    #[test]
    fn rejects_unknown_tag() {
        let encoded = Base64UrlUnpadded::encode_string(b"pager42");
        assert_eq!(decode_reference(&encoded), Err(ReferenceError::UnknownKind));
    }

    #[test]
    fn rejects_non_numeric_and_missing_id() {
        let no_id = Base64UrlUnpadded::encode_string(b"email");
        assert_eq!(decode_reference(&no_id), Err(ReferenceError::TooShort));

        let junk_id = Base64UrlUnpadded::encode_string(b"emailforty-two");
        assert_eq!(decode_reference(&junk_id), Err(ReferenceError::InvalidId));

        let negative = Base64UrlUnpadded::encode_string(b"email-42");
        assert_eq!(decode_reference(&negative), Err(ReferenceError::InvalidId));
    }

    #[test]
    fn rejects_non_utf8_payload() {
        let encoded = Base64UrlUnpadded::encode_string(&[0xFF, 0xFE, 0xFD, 0xFC, 0xFB, 0xFA]);
        assert_eq!(decode_reference(&encoded), Err(ReferenceError::Utf8));
    }
}
