pub mod fetch;
pub mod resources;
pub mod setup;
pub mod ui;
