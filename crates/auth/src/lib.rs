//! `rxconsole-auth` — account records and the pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod activity;
pub mod authorize;
pub mod organization;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod session;
pub mod user;

pub use activity::{Activity, ActivityAction, NewActivity};
pub use authorize::{
    AuthzError, can_view, ensure_can_assign, ensure_can_manage, ensure_can_place, require_role,
};
pub use organization::{NewOrganization, Organization, OrganizationPatch, OrganizationType};
pub use password::{Argon2Hasher, CredentialHasher, HashError, Sha256Hasher};
pub use permissions::RoleSet;
pub use principal::Principal;
pub use roles::Role;
pub use session::{SessionId, SessionKeyError, SessionSigner};
pub use user::{NewUser, User, UserPatch, UserStatus};
