//! Persistence module split across logical submodules.

mod components;
mod connection;

pub use components::{
    delete_component, fetch_components, replace_components, search_components,
    update_datasheet_path,
};
pub use connection::{init_schema, open_store};
