// [libs/domain/models-rs/src/lib.rs]

pub mod alert;
pub mod batch;
pub mod claims;
pub mod event;
pub mod evidence;
pub mod session;
pub mod snapshot;

pub use alert::OperatorAlert;
pub use batch::{BatchRequest, BatchVerdict, RejectionReason, WireEventRecord, WireThumbnailRecord};
pub use claims::ExamClaims;
pub use event::{AnomalyEvent, EventKind, SeverityLevel};
pub use evidence::EvidenceArtifact;
pub use session::{ExamIdentityTuple, ProctoringSession, SessionStatus};
pub use snapshot::RiskScoreSnapshot;
