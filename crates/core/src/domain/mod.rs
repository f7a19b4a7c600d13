pub mod intent;
pub mod procurement;
pub mod query;
pub mod window;
