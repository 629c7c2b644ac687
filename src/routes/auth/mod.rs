pub mod claims;
pub mod login;
pub mod logout;
pub mod session;
pub mod signup;
pub mod verify_token;

pub use login::handle_login;
pub use login::handle_me;
pub use logout::handle_logout;
pub use signup::handle_signup;
pub use verify_token::handle_verify_token;

/// Name of the cookie carrying the identity token. The same JWT is accepted
/// from the `Authorization: Bearer` header; the cookie is just a second
/// transport for the one credential.
pub const AUTH_COOKIE: &str = "auth_token";
