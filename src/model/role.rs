#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Role {
    Administrator = 1,
    Hr = 2,
    Employee = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Administrator),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            _ => None,
        }
    }
}
