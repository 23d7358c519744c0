pub mod attendance;
pub mod diagnostics;
pub mod distance;
pub mod macros;
pub mod shipment;
pub mod vehicle;

pub use attendance::*;
pub use diagnostics::*;
pub use distance::*;
pub use shipment::*;
pub use vehicle::*;
