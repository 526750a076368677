use serde::{Deserialize, Serialize};

/// An in-memory media payload ready to be sent through the session.
///
/// Created by the attachment fetcher, consumed by one send call, then
/// dropped. Nothing here is cached or reused across requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// MIME type as declared by the origin server.
    pub mime_type: String,
    /// Raw binary payload.
    pub data: Vec<u8>,
    /// Filename derived from the source URL's final path segment.
    pub filename: String,
}
