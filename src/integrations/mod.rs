//! External service integrations.

pub mod dispatch {
    pub use crate::dispatch::*;
}

pub mod rate_limit {
    pub use crate::rate_limit::*;
}
