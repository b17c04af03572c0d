//! Persistence seam for gtn-helpdesk
//!
//! Lifecycle code only sees the [`Store`] and [`Repository`] traits.
//! [`MemoryStore`] keeps everything in memory and can mirror each commit
//! to a YAML snapshot file.

mod memory;
mod repository;

pub use memory::{Dataset, MemoryStore};
pub use repository::{
    CommentRepository, MasterDataRepository, NotificationLog, Repository, SequenceAllocator,
    Store, TicketRepository, UserRepository,
};
