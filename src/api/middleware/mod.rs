pub mod guest_token;

pub use guest_token::{GuestTokenLayer, GuestTokenService};
