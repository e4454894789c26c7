#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
}

/// Privileged actions. Handlers check one of these instead of matching on
/// role literals, so the role → permission mapping lives in one place.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Capability {
    ManageEmployees,
    ManageSites,
    ManageAssignments,
    DecideLeave,
    DecideExpense,
    ManagePayroll,
    ManageRecruitment,
    PublishNotices,
    ViewDashboards,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn grants(&self, cap: Capability) -> bool {
        use Capability::*;
        match self {
            Role::Admin => true,
            Role::Hr => !matches!(cap, ManagePayroll),
            Role::Employee => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_capability() {
        for cap in [
            Capability::ManageEmployees,
            Capability::ManageSites,
            Capability::ManageAssignments,
            Capability::DecideLeave,
            Capability::DecideExpense,
            Capability::ManagePayroll,
            Capability::ManageRecruitment,
            Capability::PublishNotices,
            Capability::ViewDashboards,
        ] {
            assert!(Role::Admin.grants(cap));
        }
    }

    #[test]
    fn payroll_is_admin_only() {
        assert!(!Role::Hr.grants(Capability::ManagePayroll));
        assert!(Role::Hr.grants(Capability::DecideLeave));
        assert!(!Role::Employee.grants(Capability::DecideLeave));
    }

    #[test]
    fn unknown_role_id_is_rejected() {
        assert_eq!(Role::from_id(9), None);
        assert_eq!(Role::from_id(2), Some(Role::Hr));
    }
}
