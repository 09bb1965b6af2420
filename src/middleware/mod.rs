/// Middleware module
///
/// Access-token authentication and the static-file hit counter.

mod hit_counter;
mod jwt_middleware;

pub use hit_counter::{HitCounter, HitCounterMiddleware};
pub use jwt_middleware::{AuthenticatedUser, JwtMiddleware};
