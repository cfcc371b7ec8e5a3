mod config;
mod ctx;
mod shapes;

pub use config::ContextConfig;
pub use ctx::{Context, MeshId};
