//! Canonical recipient identifiers to wire JIDs.

use wacore_binary::jid::Jid;

use wagate_core::error::GateError;

/// Translate a canonical `<digits>@c.us` recipient into the wire JID.
///
/// `@c.us` is the legacy user-chat alias; the multidevice protocol
/// addresses users on the `s.whatsapp.net` server. Anything without the
/// alias is parsed as-is.
pub(crate) fn to_jid(chat_id: &str) -> Result<Jid, GateError> {
    let wire = match chat_id.strip_suffix("@c.us") {
        Some(user) => format!("{user}@s.whatsapp.net"),
        None => chat_id.to_string(),
    };

    wire.parse()
        .map_err(|e| GateError::Session(format!("invalid recipient '{chat_id}': {e}")))
}
