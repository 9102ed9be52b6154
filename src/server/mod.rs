pub mod router;

pub use router::{PlatformState, platform_router};
