pub mod fetch;
pub mod interact;
