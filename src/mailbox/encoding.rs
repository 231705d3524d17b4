//! Transport encodings used by the mailbox API.
//!
//! Message bodies and attachments arrive as URL-safe base64. Padding is
//! inconsistent between endpoints, so both padded and unpadded input decode.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;

use crate::error::MailboxError;

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a URL-safe base64 payload. Whitespace is ignored.
pub fn decode_base64url(data: &str) -> Result<Vec<u8>, MailboxError> {
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    URL_SAFE_LENIENT
        .decode(compact.as_bytes())
        .or_else(|_| STANDARD_LENIENT.decode(compact.as_bytes()))
        .map_err(|e| MailboxError::Decode(e.to_string()))
}

/// Encode bytes as URL-safe base64 with padding (the form the API emits).
pub fn encode_base64url(bytes: &[u8]) -> String {
    base64::engine::general_purpose::URL_SAFE.encode(bytes)
}
