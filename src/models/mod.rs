mod account;
mod pending_signup;
mod profile;
mod wedding;

pub use account::AccountResult;
pub use pending_signup::{CreatePendingSignup, PendingSignup};
pub use profile::Profile;
pub use wedding::Wedding;
