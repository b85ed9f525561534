pub mod state;

pub use state::{StateError, TerraformState};
