use std::collections::HashMap;
use tabsplit_domain::{Bill, ParticipantId, Roster};

/// Read access to stored bills, supplied by the storage collaborator.
pub trait BillSource {
    fn bills(&self) -> &[Bill];

    fn bill(&self, id: &str) -> Option<&Bill> {
        self.bills().iter().find(|bill| bill.id() == id)
    }
}

impl BillSource for Vec<Bill> {
    fn bills(&self) -> &[Bill] {
        self
    }
}

/// Display names for participant codes, used only when rendering.
pub trait ParticipantDirectory {
    fn display_name(&self, id: &ParticipantId) -> Option<&str>;
}

impl ParticipantDirectory for HashMap<ParticipantId, String> {
    fn display_name(&self, id: &ParticipantId) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}

impl ParticipantDirectory for Roster {
    fn display_name(&self, id: &ParticipantId) -> Option<&str> {
        Roster::display_name(self, id.as_str())
    }
}
