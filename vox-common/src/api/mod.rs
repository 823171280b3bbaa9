//! API types shared between the coaching service and its clients

pub mod types;

pub use types::{
    AttemptNumber, AttemptRequest, DurationCategory, PriorAttempt, UserIdentity, UserProfile,
};
