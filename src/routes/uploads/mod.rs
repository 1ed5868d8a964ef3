mod delete;
mod get;
mod post;
mod verify;

pub use delete::*;
pub use get::*;
pub use post::*;
pub use verify::*;
