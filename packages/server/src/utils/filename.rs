use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Bytes left as-is when storing a display name: alphanumerics, `_.-~` and `/`.
const DISPLAY_NAME_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// RFC 5987 `attr-char` complement, used for `filename*=`.
const RFC5987_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Percent-encode an uploaded filename for storage in the ledger.
pub fn encode_display_name(filename: &str) -> String {
    utf8_percent_encode(filename, DISPLAY_NAME_SET).to_string()
}

/// Reverse [`encode_display_name`]. Invalid UTF-8 is replaced, never rejected.
pub fn decode_display_name(name: &str) -> String {
    percent_decode_str(name).decode_utf8_lossy().into_owned()
}

/// Text after the final `.`, if any.
pub fn file_extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}

/// Build a safe `Content-Disposition` header value that forces a download.
pub fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\' | '/'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    let encoded = utf8_percent_encode(filename, RFC5987_SET);

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
