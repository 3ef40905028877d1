pub mod achievements;
pub mod analysis;
pub mod billing;
pub mod courses;
pub mod domain;
pub mod invite;
pub mod ports;
pub mod scheduling;
pub mod subscription;

pub use domain::{
    AuthSession, Course, CourseWordEntry, EnrollOutcome, Enrollment, InviteCode, PracticeMode,
    PracticeRecord, ReviewItem, ReviewSource, User, UserCredentials, UserProgress, UserWish, Word,
};
pub use ports::{DatabaseService, PaymentService, PortError, PortResult, VocabularyExtractionService};
pub use subscription::Plan;
