use crate::core::{Comment, MasterData, Ticket, TicketId, TicketNumber, User, UserId};
use crate::error::Result;
use crate::notifications::NotificationRecord;

/// Repository trait for ticket storage operations
pub trait TicketRepository {
    /// Inserts a new ticket; fails with `Conflict` if its number is taken
    fn insert_ticket(&mut self, ticket: Ticket) -> Result<()>;

    /// Replaces an existing ticket
    fn save_ticket(&mut self, ticket: &Ticket) -> Result<()>;

    fn load_ticket(&self, id: &TicketId) -> Result<Ticket>;

    fn load_ticket_by_number(&self, number: TicketNumber) -> Result<Ticket>;

    /// All tickets ordered by number
    fn load_all_tickets(&self) -> Result<Vec<Ticket>>;

    fn delete_ticket(&mut self, id: &TicketId) -> Result<()>;

    fn ticket_exists(&self, id: &TicketId) -> Result<bool>;

    /// Finds tickets matching a predicate
    fn find_tickets<F>(&self, predicate: F) -> Result<Vec<Ticket>>
    where
        F: Fn(&Ticket) -> bool,
    {
        Ok(self.load_all_tickets()?.into_iter().filter(|t| predicate(t)).collect())
    }

    /// Counts tickets matching a predicate
    fn count_tickets<F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&Ticket) -> bool,
    {
        Ok(self.load_all_tickets()?.iter().filter(|t| predicate(t)).count())
    }
}

/// Hands out ticket numbers
///
/// Allocation is not transactional: a number handed to an attempt that later
/// fails is never handed out again.
pub trait SequenceAllocator {
    fn next_ticket_number(&self) -> Result<TicketNumber>;
}

pub trait UserRepository {
    /// Inserts a new user; username and email must be unique
    fn insert_user(&mut self, user: User) -> Result<()>;

    fn save_user(&mut self, user: &User) -> Result<()>;

    fn load_user(&self, id: &UserId) -> Result<User>;

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// All users ordered by username
    fn load_all_users(&self) -> Result<Vec<User>>;

    fn delete_user(&mut self, id: &UserId) -> Result<()>;
}

pub trait CommentRepository {
    fn insert_comment(&mut self, comment: Comment) -> Result<()>;

    /// Comments on a ticket, oldest first
    fn comments_for(&self, ticket: &TicketId) -> Result<Vec<Comment>>;

    /// Returns how many comments were removed
    fn delete_comments_by(&mut self, author: &UserId) -> Result<usize>;

    /// Returns how many comments were removed
    fn delete_comments_for(&mut self, ticket: &TicketId) -> Result<usize>;
}

/// Append-only notification journal
pub trait NotificationLog {
    fn append_notification(&mut self, record: NotificationRecord) -> Result<()>;

    /// All records in insertion order
    fn load_notifications(&self) -> Result<Vec<NotificationRecord>>;
}

pub trait MasterDataRepository {
    fn load_master_data(&self) -> Result<MasterData>;

    fn save_master_data(&mut self, data: &MasterData) -> Result<()>;
}

/// Combined repository trait
pub trait Repository:
    TicketRepository
    + SequenceAllocator
    + UserRepository
    + CommentRepository
    + NotificationLog
    + MasterDataRepository
{
}

/// Implementation of Repository for types that implement every part
impl<T> Repository for T where
    T: TicketRepository
        + SequenceAllocator
        + UserRepository
        + CommentRepository
        + NotificationLog
        + MasterDataRepository
{
}

/// A store runs every unit of work as one serializable transaction
pub trait Store: Send + Sync {
    type Repo: Repository;

    /// Apply `f` atomically; nothing `f` did is visible if it returns an error
    fn transaction<R, F>(&self, operation: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut Self::Repo) -> Result<R>;

    /// Run `f` against the latest committed state
    fn read<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Self::Repo) -> Result<R>;
}
