//! Authentication
//!
//! Email/password accounts stored in the `users` table, bcrypt password
//! hashes, and stateless JWT sessions carried in an HTTP-only cookie.
//!
//! - `password` - credential rules and hashing
//! - `sessions` - token signing/verification and the session cookie
//! - `handlers` - register, login, logout and current-user endpoints

pub mod handlers;
pub mod password;
pub mod sessions;
