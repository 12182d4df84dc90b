pub mod lead;
pub mod organization;
pub mod session;
pub mod workspace_user;

pub use lead::{Lead, SiteContent};
pub use organization::{LicenseStatus, Organization, OrganizationView};
pub use session::{AttemptOutcome, SessionResult, SessionUser, StoreAttempt, StoreKind};
pub use workspace_user::{Member, MemberView, WorkspaceUser};
