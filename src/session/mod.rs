//! Stateless admin sessions.
//!
//! A successful login yields a signed token that the client keeps in an
//! http-only cookie. Nothing is stored server-side: the token proves itself
//! through its HMAC and its expiry, and logging out means the client drops
//! the cookie. Rotating the signing secret invalidates every outstanding token.

mod cookie;
mod token;

pub use cookie::{cookie_value, removal_cookie, session_cookie};
pub use token::{MAX_CLOCK_SKEW_SECS, SessionTokenCodec, TOKEN_VERSION, TokenPayload};
