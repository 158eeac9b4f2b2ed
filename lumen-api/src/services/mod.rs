//! Record pipeline services
//!
//! - Reference Resolver: label → shared reference id, with a scoped cache
//! - Record Composer: raw JSON → validated drafts
//! - Transactional Writer: atomic parent + children persistence
//! - Bulk Importer: whole-batch validation, then per-item storage

pub mod bulk_importer;
pub mod record_composer;
pub mod record_writer;
pub mod reference_resolver;

pub use bulk_importer::{compose_batch, BulkImporter, BulkOptions, InvalidItem};
pub use record_composer::{compose_emitter_patch, compose_flashlight};
pub use record_writer::RecordWriter;
pub use reference_resolver::{MissingReference, ReferenceKind, ReferenceResolver};
