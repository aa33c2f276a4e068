use gloo::{timers::callback::Timeout, utils::document};
use tracing::warn;
use wasm_bindgen::JsCast;
use web_sys::HtmlElement;

use crate::page::{NoticeLevel, PageUi};

const TOAST_MILLIS: u32 = 2800;
const TOAST_OK_COLOR: &str = "#6ee09a";
const TOAST_ERR_COLOR: &str = "#f87171";
const ALERT_DOT_STYLE: &str = "position:absolute;top:4px;right:4px;width:8px;height:8px;border-radius:50%;background:var(--danger);border:2px solid var(--surface);";

fn element(id: &str) -> Option<HtmlElement> {
    document().get_element_by_id(id)?.dyn_into::<HtmlElement>().ok()
}

/// The toast, bell icon and bell button of the page template
pub struct DomUi;

impl PageUi for DomUi {
    fn notice(&self, message: &str, level: NoticeLevel) {
        let Some(toast) = element("toast") else {
            return;
        };

        if let Some(text) = element("toast-msg") {
            text.set_text_content(Some(message));
        }

        let icon = toast
            .query_selector("i")
            .ok()
            .flatten()
            .and_then(|i| i.dyn_into::<HtmlElement>().ok());
        if let Some(icon) = icon {
            let color = match level {
                NoticeLevel::Ok => TOAST_OK_COLOR,
                NoticeLevel::Error => TOAST_ERR_COLOR,
            };
            let _ = icon.style().set_property("color", color);
        }

        if let Err(e) = toast.class_list().add_1("show") {
            warn!("Failed to show toast: {e:?}");
            return;
        }
        Timeout::new(TOAST_MILLIS, move || {
            let _ = toast.class_list().remove_1("show");
        })
        .forget();
    }

    fn mark_subscribed(&self) {
        if let Some(icon) = element("notif-icon") {
            icon.set_class_name("fa-solid fa-bell");
            let _ = icon.style().set_property("color", "var(--forest)");
        }
    }

    fn hide_opt_in(&self) {
        if let Some(button) = element("notif-btn") {
            let _ = button.style().set_property("display", "none");
        }
    }

    /// A page without the bell button counts as badged, there's nowhere to
    /// put one
    fn has_alert_badge(&self) -> bool {
        match element("notif-btn") {
            Some(button) => matches!(button.query_selector(".notif-dot"), Ok(Some(_))),
            None => true,
        }
    }

    fn add_alert_badge(&self) {
        let Some(button) = element("notif-btn") else {
            return;
        };

        let dot = match document().create_element("span") {
            Ok(dot) => dot,
            Err(e) => {
                warn!("Failed to create alert badge: {e:?}");
                return;
            }
        };
        dot.set_class_name("notif-dot");
        let _ = dot.set_attribute("style", ALERT_DOT_STYLE);

        if let Err(e) = button.append_child(&dot) {
            warn!("Failed to add alert badge: {e:?}");
        }
    }
}
