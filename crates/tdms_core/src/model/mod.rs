//! The file/group/channel object model.
//!
//! A [`TdmsFile`] owns its groups, and each [`Group`] owns its channels
//! (arena-style, no back-pointers). Every entity carries a name, an
//! insertion-ordered property bag, and a modified flag that the writer
//! drains.

mod objects;
mod properties;

pub use objects::{Channel, Group, TdmsFile};
pub use properties::Properties;
