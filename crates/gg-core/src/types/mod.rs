pub mod change;
pub mod ids;
pub mod io;

pub use change::*;
pub use ids::*;
pub use io::*;
