pub mod requests;
pub mod responses;
pub mod session;
pub mod step;

pub use requests::*;
pub use responses::*;
pub use session::*;
pub use step::*;
