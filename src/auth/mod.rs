pub mod jwt;
pub mod middleware;
pub mod password;

use crate::models::UserEntity;

/// Resolve the single role tag carried in issued tokens. Accounts may hold
/// several role flags; precedence is customer > company > chef.
pub fn resolve_user_type(user: &UserEntity) -> Option<&'static str> {
    if user.is_customer {
        Some("customer")
    } else if user.is_company {
        Some("company")
    } else if user.is_chef {
        Some("chef")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(is_customer: bool, is_company: bool, is_chef: bool) -> UserEntity {
        UserEntity {
            id: 1,
            username: "someone".to_string(),
            password_hash: String::new(),
            email: None,
            is_chef,
            is_customer,
            is_company,
            is_staff: false,
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn single_flags_resolve_directly() {
        assert_eq!(resolve_user_type(&user(true, false, false)), Some("customer"));
        assert_eq!(resolve_user_type(&user(false, true, false)), Some("company"));
        assert_eq!(resolve_user_type(&user(false, false, true)), Some("chef"));
    }

    #[test]
    fn customer_takes_precedence_over_company_and_chef() {
        assert_eq!(resolve_user_type(&user(true, true, true)), Some("customer"));
        assert_eq!(resolve_user_type(&user(false, true, true)), Some("company"));
    }

    #[test]
    fn no_flags_means_no_recognized_role() {
        assert_eq!(resolve_user_type(&user(false, false, false)), None);
    }
}
