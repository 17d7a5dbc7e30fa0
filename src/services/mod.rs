pub mod user_service;
pub mod user_service_impl;
pub use user_service::{
    StoredFile, UserDto, UserError, UserInput, UserListQuery, UserListResponse, UserService,
};
pub use user_service_impl::SeaOrmUserService;
