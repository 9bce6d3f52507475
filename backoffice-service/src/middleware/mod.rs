pub mod caller;

pub use caller::{Caller, CALLER_EMAIL_HEADER};
