mod alerts;
mod notification;
mod subscription;

pub use alerts::*;
pub use notification::*;
pub use subscription::*;
