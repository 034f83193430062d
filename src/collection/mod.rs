pub mod config;
pub mod cycle;
pub mod policy;
pub mod time_window;
pub mod top_n;
pub mod trending;

pub use config::*;
pub use cycle::*;
pub use policy::*;
pub use time_window::*;
pub use top_n::*;
pub use trending::*;
