#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

pub mod collection;
pub mod error;
pub mod fixtures;
pub mod ids;
pub mod migrate;
pub mod record;
pub mod seeder;
pub mod store;
pub mod validate;

pub use collection::{Collection, FieldStyle};
pub use error::{Error, Result};
pub use fixtures::SeedSet;
pub use record::{
    ActivityEntry, AuditEntry, Device, FileEntry, FileStatus, PresenceEntry, PresenceStatus,
    Record, Severity,
};
pub use seeder::{CollectionReport, CountCheck, SeedOptions, SeedReport, Seeder};
pub use store::{DocumentStore, MemoryStore, MongoStore};
pub use validate::Violation;
