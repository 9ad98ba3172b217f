//! Inter-session annotation agreement

pub mod engine;
pub mod recompute;

pub use engine::{
    compare, overlap_percent, AgreementLevel, AgreementRecord, Comparison, PairMetrics,
    SessionAnnotations,
};
pub use recompute::recompute_for_fingerprint;
