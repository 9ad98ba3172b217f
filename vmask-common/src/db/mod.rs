//! Database access layer
//!
//! SQLite persistence shared by the VMask services. Schema creation is
//! idempotent; query modules are grouped per table family.

pub mod agreement;
pub mod annotation_sets;
pub mod init;
pub mod jobs;
pub mod models;

pub use init::init_database;
