pub mod leave_banks;
pub mod me;
pub mod requests;

pub use leave_banks::*;
pub use me::*;
pub use requests::*;
