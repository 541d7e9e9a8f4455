pub mod config;
pub mod list;
pub mod plugins;
pub mod resolve;
pub mod tags;

pub use config::ConfigCmd;
pub use list::List;
pub use plugins::Plugins;
pub use resolve::Resolve;
pub use tags::TagsCli;
