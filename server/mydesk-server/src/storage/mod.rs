//! File-backed persistence: JSON collection files, register attachments and
//! the legacy register import

pub mod attachments;
pub mod json_store;
pub mod legacy;

pub use attachments::{decode_data_url, sanitize_filename, AttachmentStore};
pub use json_store::{JsonStore, Locked};
pub use legacy::{ImportSummary, LegacyImport};
