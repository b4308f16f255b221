//! NFC NDEF URI record decoding (well-known type `U`).

/// TNF for NFC Forum well-known types.
pub const TNF_WELL_KNOWN: u8 = 0x01;

/// URI identifier codes from the NFC Forum URI record type definition.
const URI_PREFIXES: &[&str] = &[
    "",
    "http://www.",
    "https://www.",
    "http://",
    "https://",
    "tel:",
    "mailto:",
];

/// Extract the URI from the first record of an NDEF message.
///
/// The first payload byte is the abbreviation code; `0x00` means the rest is the full URI.
pub fn uri_from_record(tnf: u8, payload: &[u8]) -> Option<String> {
    if tnf != TNF_WELL_KNOWN {
        return None;
    }
    let (&code, rest) = payload.split_first()?;
    let prefix = match URI_PREFIXES.get(usize::from(code)) {
        Some(prefix) => *prefix,
        None => {
            tracing::debug!(code, "unsupported NDEF URI code, using raw payload");
            ""
        }
    };
    let body = String::from_utf8_lossy(rest);
    if prefix.is_empty() && body.is_empty() {
        return None;
    }
    Some(format!("{prefix}{body}"))
}
