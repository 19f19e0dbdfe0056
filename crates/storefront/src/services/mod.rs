//! External collaborators behind narrow contracts.
//!
//! The core never talks to the network itself: handlers call these
//! services and only hand resolved plain data (photo references, payment
//! intents, sent-mail confirmations) onward.

pub mod auth;
pub mod email;
pub mod media;
pub mod payments;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use media::{MediaClient, MediaError};
pub use payments::{PaymentClient, PaymentError};
