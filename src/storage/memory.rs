use super::repository::{
    CommentRepository, MasterDataRepository, NotificationLog, SequenceAllocator, Store,
    TicketRepository, UserRepository,
};
use crate::core::{Comment, MasterData, Ticket, TicketId, TicketNumber, User, UserId};
use crate::error::{HelpdeskError, Result};
use crate::notifications::NotificationRecord;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Everything the helpdesk persists
///
/// Cloning a dataset shares its ticket sequence, so numbers allocated inside
/// a rolled-back transaction stay consumed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    users: BTreeMap<UserId, User>,
    #[serde(default)]
    tickets: BTreeMap<TicketId, Ticket>,
    #[serde(default)]
    comments: Vec<Comment>,
    #[serde(default)]
    notifications: Vec<NotificationRecord>,
    #[serde(default)]
    master_data: MasterData,
    /// Highest ticket number ever handed out
    #[serde(default)]
    ticket_sequence: u64,
    #[serde(skip)]
    sequence: Arc<AtomicU64>,
}

impl Dataset {
    /// Empty dataset with the default master data rows
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            master_data: MasterData::defaults(),
            ..Self::default()
        }
    }

    /// Point the sequence at the highest number seen so far
    fn resync_sequence(&mut self) {
        let highest = self
            .tickets
            .values()
            .map(|t| t.number.sequence())
            .max()
            .unwrap_or(0)
            .max(self.ticket_sequence);
        self.sequence = Arc::new(AtomicU64::new(highest));
        self.ticket_sequence = highest;
    }

    /// Never hand out a number at or below `floor`
    fn raise_sequence(&mut self, floor: u64) {
        self.sequence.fetch_max(floor, Ordering::SeqCst);
    }

    fn user_count(&self) -> usize {
        self.users.len()
    }
}

impl TicketRepository for Dataset {
    fn insert_ticket(&mut self, ticket: Ticket) -> Result<()> {
        if self.tickets.values().any(|t| t.number == ticket.number) {
            return Err(HelpdeskError::Conflict(format!(
                "Ticket number {} already exists",
                ticket.number
            )));
        }
        if self.tickets.contains_key(&ticket.id) {
            return Err(HelpdeskError::Conflict(format!("Ticket {} already exists", ticket.id)));
        }
        self.tickets.insert(ticket.id, ticket);
        Ok(())
    }

    fn save_ticket(&mut self, ticket: &Ticket) -> Result<()> {
        let slot = self
            .tickets
            .get_mut(&ticket.id)
            .ok_or_else(|| HelpdeskError::not_found("Ticket", ticket.number))?;
        *slot = ticket.clone();
        Ok(())
    }

    fn load_ticket(&self, id: &TicketId) -> Result<Ticket> {
        self.tickets
            .get(id)
            .cloned()
            .ok_or_else(|| HelpdeskError::not_found("Ticket", id))
    }

    fn load_ticket_by_number(&self, number: TicketNumber) -> Result<Ticket> {
        self.tickets
            .values()
            .find(|t| t.number == number)
            .cloned()
            .ok_or_else(|| HelpdeskError::not_found("Ticket", number))
    }

    fn load_all_tickets(&self) -> Result<Vec<Ticket>> {
        let mut tickets: Vec<_> = self.tickets.values().cloned().collect();
        tickets.sort_by_key(|t| t.number);
        Ok(tickets)
    }

    fn delete_ticket(&mut self, id: &TicketId) -> Result<()> {
        self.tickets
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| HelpdeskError::not_found("Ticket", id))
    }

    fn ticket_exists(&self, id: &TicketId) -> Result<bool> {
        Ok(self.tickets.contains_key(id))
    }
}

impl SequenceAllocator for Dataset {
    fn next_ticket_number(&self) -> Result<TicketNumber> {
        let next = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TicketNumber::new(next))
    }
}

impl UserRepository for Dataset {
    fn insert_user(&mut self, user: User) -> Result<()> {
        for existing in self.users.values() {
            if existing.username.eq_ignore_ascii_case(&user.username) {
                return Err(HelpdeskError::validation(format!(
                    "Username '{}' already exists",
                    user.username
                )));
            }
            if existing.email.eq_ignore_ascii_case(&user.email) {
                return Err(HelpdeskError::validation(format!(
                    "Email '{}' already registered",
                    user.email
                )));
            }
        }
        self.users.insert(user.id, user);
        Ok(())
    }

    fn save_user(&mut self, user: &User) -> Result<()> {
        let slot = self
            .users
            .get_mut(&user.id)
            .ok_or_else(|| HelpdeskError::not_found("User", &user.username))?;
        *slot = user.clone();
        Ok(())
    }

    fn load_user(&self, id: &UserId) -> Result<User> {
        self.users
            .get(id)
            .cloned()
            .ok_or_else(|| HelpdeskError::not_found("User", id))
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username.trim()))
            .cloned())
    }

    fn load_all_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<_> = self.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    fn delete_user(&mut self, id: &UserId) -> Result<()> {
        self.users
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| HelpdeskError::not_found("User", id))
    }
}

impl CommentRepository for Dataset {
    fn insert_comment(&mut self, comment: Comment) -> Result<()> {
        if !self.tickets.contains_key(&comment.ticket_id) {
            return Err(HelpdeskError::not_found("Ticket", comment.ticket_id));
        }
        self.comments.push(comment);
        Ok(())
    }

    fn comments_for(&self, ticket: &TicketId) -> Result<Vec<Comment>> {
        let mut comments: Vec<_> = self
            .comments
            .iter()
            .filter(|c| &c.ticket_id == ticket)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    fn delete_comments_by(&mut self, author: &UserId) -> Result<usize> {
        let before = self.comments.len();
        self.comments.retain(|c| &c.author_id != author);
        Ok(before - self.comments.len())
    }

    fn delete_comments_for(&mut self, ticket: &TicketId) -> Result<usize> {
        let before = self.comments.len();
        self.comments.retain(|c| &c.ticket_id != ticket);
        Ok(before - self.comments.len())
    }
}

impl NotificationLog for Dataset {
    fn append_notification(&mut self, record: NotificationRecord) -> Result<()> {
        self.notifications.push(record);
        Ok(())
    }

    fn load_notifications(&self) -> Result<Vec<NotificationRecord>> {
        Ok(self.notifications.clone())
    }
}

impl MasterDataRepository for Dataset {
    fn load_master_data(&self) -> Result<MasterData> {
        Ok(self.master_data.clone())
    }

    fn save_master_data(&mut self, data: &MasterData) -> Result<()> {
        self.master_data = data.clone();
        Ok(())
    }
}

/// Mutex-serialized store with snapshot-and-swap transactions
///
/// When a snapshot path is set, every commit is first written to that YAML
/// file (via a temporary file and rename); a failed write aborts the commit.
/// Transactions also hold an exclusive lock on `<snapshot>.lock` and start
/// from the file's current contents, so several processes sharing one
/// snapshot commit one after another.
#[derive(Debug)]
pub struct MemoryStore {
    data: Mutex<Dataset>,
    snapshot_path: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Dataset::seeded())
    }
}

impl MemoryStore {
    /// Volatile store over `dataset`
    #[must_use]
    pub fn new(mut dataset: Dataset) -> Self {
        dataset.resync_sequence();
        Self {
            data: Mutex::new(dataset),
            snapshot_path: None,
        }
    }

    /// Load the snapshot at `path`; commits are written back to it
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(HelpdeskError::custom(format!(
                "No helpdesk state at {}. Run `gtn-helpdesk init` first",
                path.display()
            )));
        }
        let dataset = {
            let _lock = SnapshotLock::shared(&path)?;
            load_snapshot(&path)?
        };
        let mut store = Self::new(dataset);
        tracing::debug!(path = %path.display(), "state loaded");
        store.snapshot_path = Some(path);
        Ok(store)
    }

    /// Write `dataset` to a new snapshot at `path` and open it
    pub fn create(path: impl Into<PathBuf>, dataset: Dataset) -> Result<Self> {
        let path = path.into();
        let mut store = Self::new(dataset);
        {
            let mut data = store.lock()?;
            let _lock = SnapshotLock::exclusive(&path)?;
            write_snapshot(&path, &mut data)?;
        }
        store.snapshot_path = Some(path);
        Ok(store)
    }

    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Number of user accounts; used to detect an empty installation
    pub fn user_count(&self) -> Result<usize> {
        self.read(|data| Ok(data.user_count()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Dataset>> {
        self.data
            .lock()
            .map_err(|_| HelpdeskError::FatalStore("store lock poisoned".to_string()))
    }
}

impl Store for MemoryStore {
    type Repo = Dataset;

    fn transaction<R, F>(&self, operation: &str, f: F) -> Result<R>
    where
        F: FnOnce(&mut Self::Repo) -> Result<R>,
    {
        let mut committed = self.lock()?;
        let _lock = match &self.snapshot_path {
            Some(path) => {
                let fatal = |e: HelpdeskError| {
                    tracing::error!(operation, error = %e, "failed to load state for transaction");
                    HelpdeskError::FatalStore(format!("{operation}: {e}"))
                };
                let lock = SnapshotLock::exclusive(path).map_err(fatal)?;
                refresh(&mut committed, path).map_err(fatal)?;
                Some(lock)
            },
            None => None,
        };
        let mut working = committed.clone();

        match f(&mut working) {
            Ok(value) => {
                if let Some(path) = &self.snapshot_path {
                    write_snapshot(path, &mut working).map_err(|e| {
                        tracing::error!(operation, error = %e, "failed to persist transaction");
                        HelpdeskError::FatalStore(format!("{operation}: {e}"))
                    })?;
                }
                *committed = working;
                tracing::debug!(operation, "transaction committed");
                Ok(value)
            },
            Err(err) => {
                tracing::debug!(operation, error = %err, "transaction rolled back");
                Err(err)
            },
        }
    }

    fn read<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Self::Repo) -> Result<R>,
    {
        let mut committed = self.lock()?;
        if let Some(path) = &self.snapshot_path {
            let _lock = SnapshotLock::shared(path)?;
            refresh(&mut committed, path)?;
        }
        f(&committed)
    }
}

/// Advisory lock on the sidecar `<snapshot>.lock` file, released on drop
///
/// The snapshot itself is replaced by rename on every commit, so the lock
/// lives on a file that is never replaced.
struct SnapshotLock {
    file: File,
}

impl SnapshotLock {
    fn exclusive(snapshot: &Path) -> Result<Self> {
        let file = open_lock_file(snapshot)?;
        FileExt::lock_exclusive(&file)?;
        Ok(Self { file })
    }

    fn shared(snapshot: &Path) -> Result<Self> {
        let file = open_lock_file(snapshot)?;
        FileExt::lock_shared(&file)?;
        Ok(Self { file })
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "failed to release state lock");
        }
    }
}

fn open_lock_file(snapshot: &Path) -> Result<File> {
    if let Some(parent) = snapshot.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut name = snapshot.as_os_str().to_owned();
    name.push(".lock");
    Ok(OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(PathBuf::from(name))?)
}

fn load_snapshot(path: &Path) -> Result<Dataset> {
    let content = fs::read_to_string(path)?;
    let mut dataset: Dataset = serde_yaml::from_str(&content)?;
    dataset.resync_sequence();
    Ok(dataset)
}

/// Replace `data` with what another process may have committed since
///
/// Numbers this process already burnt stay burnt.
fn refresh(data: &mut Dataset, path: &Path) -> Result<()> {
    if !path.is_file() {
        return Ok(());
    }
    let floor = data.sequence.load(Ordering::SeqCst);
    let mut fresh = load_snapshot(path)?;
    fresh.raise_sequence(floor);
    *data = fresh;
    Ok(())
}

fn write_snapshot(path: &Path, data: &mut Dataset) -> Result<()> {
    data.ticket_sequence = data.sequence.load(Ordering::SeqCst);
    let content = serde_yaml::to_string(&*data)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("yaml.tmp");
    fs::write(&tmp, content)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}
