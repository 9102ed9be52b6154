pub mod extract;
pub mod session;

pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use session::CurrentUser;
