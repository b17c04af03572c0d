//! Core domain types for the helpdesk
//!
//! Tickets, users, comments and master data, plus the builders used to
//! assemble them. Nothing in this module performs I/O.

/// Declares a UUID-backed identifier newtype
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Generate a fresh random identifier
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Wrap an existing UUID
            #[must_use]
            pub const fn from_uuid(id: uuid::Uuid) -> Self {
                Self(id)
            }

            /// Parse from the hyphenated string form
            pub fn parse_str(s: &str) -> std::result::Result<Self, uuid::Error> {
                uuid::Uuid::parse_str(s).map(Self)
            }

            /// First eight characters, for compact display
            #[must_use]
            pub fn short(&self) -> String {
                self.0.to_string()[..8].to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

mod builders;
mod master_data;
mod origin;
mod ticket;
mod user;

pub use builders::{TicketBuilder, UserBuilder};
pub use master_data::{Category, MasterData, MasterDataKind, PriorityLevel, StatusLabel};
pub use origin::{RequestOrigin, infer_system_name, resolve_client_ip};
pub use ticket::{
    Attachment, AttachmentKind, Comment, CommentId, Status, Ticket, TicketId, TicketNumber,
    DELETED_USER_LABEL, DELETED_USER_SUFFIX,
};
pub use user::{Role, User, UserId};
