pub mod config;
pub mod extract;
pub mod header;
pub mod reconcile;
pub mod util;

pub use config::*;
pub use extract::*;
pub use header::*;
pub use reconcile::*;
pub use util::*;
