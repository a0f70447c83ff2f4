// Domain-layer modules and shared errors/models
pub mod errors {
    pub use crate::errors::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod spam {
    pub use crate::spam::*;
}

pub mod validation {
    pub use crate::validation::*;
}
