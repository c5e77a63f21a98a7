/*!
 * # Role-Based Access Control (RBAC) Module
 *
 * Maps caller roles to the operations they may perform.
 */

use crate::entities::user::Role;

impl Role {
    /// Admins and super admins register stock; managers only hold it.
    pub fn can_register_phones(self) -> bool {
        match self {
            Role::Admin | Role::SuperAdmin => true,
            Role::Manager => false,
        }
    }

    /// Whether a user with this role can be assigned phones as their custodian.
    pub fn holds_phones(self) -> bool {
        match self {
            Role::Manager => true,
            Role::Admin | Role::SuperAdmin => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admins_register_phones() {
        assert!(Role::Admin.can_register_phones());
        assert!(Role::SuperAdmin.can_register_phones());
        assert!(!Role::Manager.can_register_phones());
    }

    #[test]
    fn only_managers_hold_phones() {
        assert!(Role::Manager.holds_phones());
        assert!(!Role::Admin.holds_phones());
    }

    #[test]
    fn role_names_parse_from_tokens() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("super_admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("super admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("manager".parse::<Role>().unwrap(), Role::Manager);
        assert!("owner".parse::<Role>().is_err());
    }
}
