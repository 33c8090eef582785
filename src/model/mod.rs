pub mod attendance;
pub mod leave_request;
pub mod office;
pub mod role;
pub mod user;
