pub mod arguments;
pub mod classpath;
pub mod options;
pub mod task;

pub use arguments::PlaceholderTable;
pub use classpath::{build_search_path, join_search_path};
pub use options::GameOptions;
pub use task::{launch, Composer, LaunchCommand, LaunchOptions};
