pub mod appeal;
pub mod claim;
pub mod enums;
pub mod payer;
pub mod user;

pub use appeal::*;
pub use claim::*;
pub use enums::*;
pub use payer::*;
pub use user::*;
