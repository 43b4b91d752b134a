pub mod app_state;
pub mod layout;
pub mod settings;

pub use app_state::AppState;
pub use layout::GameLayout;
pub use settings::{resolve_root, LauncherSettings};
