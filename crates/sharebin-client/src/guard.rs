use crate::slices::AuthSlice;

/// Who a screen is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    SignedIn,
    AdminOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGuard {
    Allow,
    RedirectToLogin,
    RedirectToUnauthorized,
}

impl RouteGuard {
    pub fn check(auth: &AuthSlice, access: Access) -> Self {
        match access {
            Access::Public => Self::Allow,
            _ if !auth.is_authenticated() => Self::RedirectToLogin,
            Access::AdminOnly if !auth.is_admin() => Self::RedirectToUnauthorized,
            _ => Self::Allow,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sharebin_types::api::LoginResponse;
    use sharebin_types::{PublicUser, Role};

    use super::*;
    use crate::storage::DeviceStorage;

    fn signed_in(role: Role) -> AuthSlice {
        let tmp = tempfile::tempdir().unwrap();
        let storage = DeviceStorage::open(tmp.path()).unwrap();
        let mut auth = AuthSlice::default();
        let session = LoginResponse {
            user: PublicUser {
                id: "u1".into(),
                username: "alice".into(),
                name: "alice".into(),
                role,
                email: String::new(),
                created_at: Utc::now(),
            },
            token: "jwt".into(),
        };
        auth.login(session, &storage).unwrap();
        auth
    }

    #[test]
    fn anonymous_is_sent_to_login() {
        let auth = AuthSlice::default();
        assert_eq!(RouteGuard::check(&auth, Access::Public), RouteGuard::Allow);
        assert_eq!(RouteGuard::check(&auth, Access::SignedIn), RouteGuard::RedirectToLogin);
        assert_eq!(RouteGuard::check(&auth, Access::AdminOnly), RouteGuard::RedirectToLogin);
    }

    #[test]
    fn admin_routes_need_admin() {
        let user = signed_in(Role::User);
        assert_eq!(RouteGuard::check(&user, Access::SignedIn), RouteGuard::Allow);
        assert_eq!(
            RouteGuard::check(&user, Access::AdminOnly),
            RouteGuard::RedirectToUnauthorized
        );

        let admin = signed_in(Role::Admin);
        assert_eq!(RouteGuard::check(&admin, Access::AdminOnly), RouteGuard::Allow);
    }
}
