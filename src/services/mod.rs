// Services module - business logic layer

pub mod cart_service;
pub mod catalogue_client;
pub mod catalogue_service;
pub mod user_service;

pub use cart_service::CartService;
pub use catalogue_client::{CatalogueClient, HttpCatalogueClient};
pub use catalogue_service::CatalogueService;
pub use user_service::UserService;
