//! # wagate-whatsapp
//!
//! WhatsApp session manager — pure Rust via `whatsapp-rust`.
//!
//! Speaks the WhatsApp Web multidevice protocol (Noise handshake + Signal
//! encryption). Pairing is done by scanning a QR code, like WhatsApp Web.
//! Session keys are persisted to `{data_dir}/whatsapp_session/whatsapp.db`,
//! so the QR scan is a one-time bootstrap per process lifetime.

mod bot;
mod events;
mod jid;
mod qr;
mod session;


pub use qr::{generate_qr_image, generate_qr_terminal};
pub use session::WhatsAppSession;
