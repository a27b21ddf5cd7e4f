#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HandleRole {
    Reader,
    Writer,
}

/// A capability value, not an address. Only the `chronicle` module can
/// construct a `Writer`-role handle; every write call additionally re-checks
/// the role at the point of use, so losing track of a handle never grants
/// write access on its own.
#[derive(Debug, Clone)]
pub struct ChronicleHandle {
    role: HandleRole,
    owner: String,
}

impl ChronicleHandle {
    pub(crate) fn reader(owner: impl Into<String>) -> Self {
        Self {
            role: HandleRole::Reader,
            owner: owner.into(),
        }
    }

    pub(crate) fn writer(owner: impl Into<String>) -> Self {
        Self {
            role: HandleRole::Writer,
            owner: owner.into(),
        }
    }

    pub fn role(&self) -> HandleRole {
        self.role
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn is_writer(&self) -> bool {
        self.role == HandleRole::Writer
    }
}
