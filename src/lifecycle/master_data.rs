use super::{Helpdesk, current_actor};
use crate::core::{MasterData, MasterDataKind, Status, User};
use crate::error::Result;
use crate::policy::AccessPolicy;
use crate::storage::{MasterDataRepository, Store};

impl<S: Store> Helpdesk<S> {
    /// Current categories, priorities and status labels
    pub fn master_data(&self) -> Result<MasterData> {
        self.store.read(|tx| tx.load_master_data())
    }

    pub fn add_category(&self, actor: &User, name: &str, description: Option<String>) -> Result<MasterData> {
        self.edit_master_data(actor, "add_category", |data| data.add_category(name, description))
    }

    pub fn add_priority(
        &self,
        actor: &User,
        name: &str,
        level: u8,
        color_code: Option<String>,
        description: Option<String>,
    ) -> Result<MasterData> {
        self.edit_master_data(actor, "add_priority", |data| {
            data.add_priority(name, level, color_code, description)
        })
    }

    pub fn add_status(
        &self,
        actor: &User,
        status: Status,
        color_code: Option<String>,
        description: Option<String>,
    ) -> Result<MasterData> {
        self.edit_master_data(actor, "add_status", |data| data.add_status(status, color_code, description))
    }

    /// Enable or disable a row; existing tickets keep their values
    pub fn set_master_data_active(
        &self,
        actor: &User,
        kind: MasterDataKind,
        name: &str,
        active: bool,
    ) -> Result<MasterData> {
        self.edit_master_data(actor, "set_master_data_active", |data| data.set_active(kind, name, active))
    }

    fn edit_master_data<F>(&self, actor: &User, operation: &str, edit: F) -> Result<MasterData>
    where
        F: FnOnce(&mut MasterData) -> Result<()>,
    {
        let data = self.store.transaction(operation, |tx| {
            let actor = current_actor(tx, actor)?;
            AccessPolicy::ensure_manage(&actor, "edit master data")?;

            let mut data = tx.load_master_data()?;
            edit(&mut data)?;
            tx.save_master_data(&data)?;
            Ok(data)
        })?;

        tracing::info!(operation, by = %actor.username, "master data updated");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{MasterDataKind, RequestOrigin, Role};
    use crate::error::HelpdeskError;
    use crate::lifecycle::NewTicket;
    use crate::test_utils::TestHelpdesk;

    #[test]
    fn test_inactive_category_blocks_new_tickets_only() {
        let env = TestHelpdesk::new();
        let user = env.user("testuser", Role::User, "");
        let existing = env.create_ticket(&user, "Printer not working");

        env.helpdesk
            .set_master_data_active(&env.admin, MasterDataKind::Category, "hardware", false)
            .unwrap();

        let request = NewTicket::new("Keyboard missing keys", "Several keys fell off the keyboard", "Hardware", "Low");
        assert!(env
            .helpdesk
            .create_ticket(&user, request, &RequestOrigin::default())
            .is_err());

        let view = env.helpdesk.ticket(&user, existing.number).unwrap();
        assert_eq!(view.ticket.category, "Hardware");
    }

    #[test]
    fn test_new_priority_is_usable() {
        let env = TestHelpdesk::new();
        let user = env.user("testuser", Role::User, "");
        let data = env
            .helpdesk
            .add_priority(&env.admin, "Urgent", 5, Some("#ff0000".into()), None)
            .unwrap();
        assert_eq!(data.active_priorities().last().unwrap().name, "Urgent");

        let request = NewTicket::new("Server room too hot", "The AC unit in the server room failed", "Other", "urgent");
        let ticket = env
            .helpdesk
            .create_ticket(&user, request, &RequestOrigin::default())
            .unwrap()
            .value;
        assert_eq!(ticket.priority, "Urgent");
    }

    #[test]
    fn test_master_data_is_super_admin_only() {
        let env = TestHelpdesk::new();
        let admin = env.user("helper", Role::Admin, "IT");
        assert!(matches!(
            env.helpdesk.add_category(&admin, "Facilities", None),
            Err(HelpdeskError::Forbidden { .. })
        ));
        assert!(env.helpdesk.master_data().unwrap().active_category("Facilities").is_none());
    }
}
