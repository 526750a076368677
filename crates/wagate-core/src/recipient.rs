//! Recipient identifier canonicalization.

/// Suffix expected by the messaging backend for user chats.
pub const CHAT_SUFFIX: &str = "@c.us";

/// Coerce a raw recipient string into the canonical `<digits>@c.us` form.
///
/// Inputs already carrying the suffix pass through unchanged; everything
/// else gets the suffix appended. Applied before every send call.
pub fn canonicalize(number: &str) -> String {
    if number.ends_with(CHAT_SUFFIX) {
        number.to_string()
    } else {
        format!("{number}{CHAT_SUFFIX}")
    }
}
