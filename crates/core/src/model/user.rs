use serde::{Deserialize, Serialize};

/// Identity of the already-authorized test-taker, supplied by the
/// authentication collaborator. The engine never validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub display_name: String,
    pub department: String,
}

impl UserIdentity {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            department: department.into(),
        }
    }
}
