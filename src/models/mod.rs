pub mod achievement;
pub mod interview;
pub mod job;
pub mod readiness;
pub mod resume;
pub mod roadmap;
pub mod user;

pub use achievement::*;
pub use interview::*;
pub use job::*;
pub use readiness::*;
pub use resume::*;
pub use roadmap::*;
pub use user::*;
