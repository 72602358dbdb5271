pub mod attendance;
pub mod pagination;
pub mod report;
pub mod role;
pub mod user;
