// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    Delivery, colorize_line, deliver, delivery_json, expand_path, load_settings, write_artifact,
};
