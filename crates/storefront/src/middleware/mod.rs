//! Request middleware: sessions, authentication, and the role policy.

pub mod auth;
pub mod policy;
pub mod session;

pub use auth::RequireAuth;
pub use policy::authorize;
pub use session::create_session_layer;
