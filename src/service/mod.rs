pub mod openpack;
pub mod password;
pub mod sites;
pub mod users;

pub use openpack::OpenpackService;
pub use sites::SiteService;
pub use users::UserService;
