//! Page side of the FIN.AI push notifications: opting in, reflecting the
//! current permission and badging the bell when alerts are waiting

pub mod alerts;
pub mod page;
pub mod push;

#[cfg(test)]
mod testing;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use alerts::check_pending_alerts;
pub use page::{is_reusable, Api, NoticeLevel, Page, PageUi, Permission, PushTransport, Subscribed, VapidKeyProvider};
pub use push::{decode_application_server_key, init_push_notifications, register_interest, OptInError};
