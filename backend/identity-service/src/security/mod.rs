pub mod clock;
pub mod password;

pub use clock::{Clock, ManualClock, SystemClock};
pub use password::{hash_password, validate_password_policy, verify_password};
