use const_format::concatcp;
pub mod error;
pub mod payloads;

pub const API_BASE_PATH: &str = "/journal/api/";
pub const STATIC_BASE_PATH: &str = "/static/";
pub const CSRF_HEADER: &str = "X-CSRFToken";
pub const CSRF_COOKIE: &str = "csrftoken";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Object {
    PushSubscribe,
    PushCheck,
    Offline,
    Dashboard,
}

impl Object {
    pub const fn path(&self) -> &'static str {
        use Object::*;
        match self {
            PushSubscribe => concatcp!(API_BASE_PATH, "push/subscribe/"),
            PushCheck => concatcp!(API_BASE_PATH, "push/check/"),
            Offline => "/offline/",
            Dashboard => "/dashboard/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Asset {
    Stylesheet,
    PwaStylesheet,
    Script,
    WebManifest,
    Icon192,
    Icon512,
}

impl Asset {
    pub const ALL: [Asset; 6] = [
        Asset::Stylesheet,
        Asset::PwaStylesheet,
        Asset::Script,
        Asset::WebManifest,
        Asset::Icon192,
        Asset::Icon512,
    ];

    pub const fn path(&self) -> &'static str {
        use Asset::*;
        match self {
            Stylesheet => concatcp!(STATIC_BASE_PATH, "css/finai.css"),
            PwaStylesheet => concatcp!(STATIC_BASE_PATH, "css/pwa.css"),
            Script => concatcp!(STATIC_BASE_PATH, "js/finai.js"),
            WebManifest => concatcp!(STATIC_BASE_PATH, "manifest.json"),
            Icon192 => concatcp!(STATIC_BASE_PATH, "icons/icon-192.png"),
            Icon512 => concatcp!(STATIC_BASE_PATH, "icons/icon-512.png"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_paths_are_rooted() {
        assert_eq!(Object::PushSubscribe.path(), "/journal/api/push/subscribe/");
        assert_eq!(Object::PushCheck.path(), "/journal/api/push/check/");
        for asset in Asset::ALL {
            assert!(asset.path().starts_with(STATIC_BASE_PATH), "{asset:?}");
        }
    }
}
