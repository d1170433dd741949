pub mod approvals;
pub mod bulk;
pub mod leave;
pub mod leave_bank;
pub mod roles;
pub mod state_machine;

pub use approvals::{ApprovalPolicy, ApprovalService};
pub use roles::{resolve_authority, Actor, AuthorityProfile, RoleInputs};
