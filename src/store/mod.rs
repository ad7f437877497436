//! Session store — durable session bodies plus mutable tag metadata.
//!
//! The serving layer logs one object per session; all review state lives in
//! a small string tag set attached to the object, readable without touching
//! the body. [`ObjectStore`] is the external contract (immutable bodies,
//! full-replace tags); [`FsObjectStore`] is the shipped filesystem adapter
//! and [`MemoryObjectStore`] backs tests. The typed session model sits on
//! top and owns the monotonic review-state transitions.

pub mod fs;
pub mod memory;
pub mod object;
pub mod session;

pub use fs::FsObjectStore;
pub use memory::MemoryObjectStore;
pub use object::{ObjectStore, StoreError, TagSet};
pub use session::{
    put_session, session_key, truncate_to_bytes, FeedbackType, ReviewStatus, SessionBody,
    SessionTags, MAX_TAG_VALUE_BYTES,
};
