pub mod instrument;
pub mod price;
pub mod regime;

pub use instrument::*;
pub use price::*;
pub use regime::*;
