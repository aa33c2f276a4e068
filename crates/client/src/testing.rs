//! In-process page for exercising the opt-in flows

use std::cell::{Cell, RefCell};

use shared::api::{
    error::{FrontendError, Nothing},
    payloads::{
        PendingAlertsResponse, PushNotificationSubscription, SubscriptionKeys, UpdateSubscriptionRequest,
    },
};

use crate::page::{is_reusable, Api, NoticeLevel, Page, PageUi, Permission, PushTransport, Subscribed};

fn subscription() -> PushNotificationSubscription {
    PushNotificationSubscription {
        endpoint: "https://push.example/send/abc".to_string(),
        expiration_time: None,
        keys: SubscriptionKeys {
            p256dh: "p256dh".to_string(),
            auth: "auth".to_string(),
        },
    }
}

#[derive(Debug)]
pub struct FakePush {
    supported: bool,
    permission: Cell<Permission>,
    /// What the permission prompt answers
    answer: Permission,
    requests: Cell<usize>,
    subscribed: Cell<bool>,
    key: RefCell<Option<Vec<u8>>>,
}

impl Default for FakePush {
    fn default() -> Self {
        Self {
            supported: true,
            permission: Cell::new(Permission::Default),
            answer: Permission::Granted,
            requests: Cell::new(0),
            subscribed: Cell::new(false),
            key: RefCell::new(None),
        }
    }
}

impl FakePush {
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::default()
        }
    }

    pub fn answering(mut self, answer: Permission) -> Self {
        self.answer = answer;
        self
    }

    pub fn with_permission(self, permission: Permission) -> Self {
        self.permission.set(permission);
        self
    }

    pub fn already_subscribed(self) -> Self {
        self.permission.set(Permission::Granted);
        self.subscribed.set(true);
        self
    }

    pub fn already_subscribed_with(self, key: &[u8]) -> Self {
        *self.key.borrow_mut() = Some(key.to_vec());
        self.already_subscribed()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.get()
    }

    pub fn subscribed_with(&self) -> Option<Vec<u8>> {
        self.key.borrow().clone()
    }

    pub fn permission_requests(&self) -> usize {
        self.requests.get()
    }
}

impl PushTransport for FakePush {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn permission(&self) -> Permission {
        self.permission.get()
    }

    async fn request_permission(&self) -> Result<Permission, FrontendError<Nothing>> {
        self.requests.set(self.requests.get() + 1);
        if self.permission.get() == Permission::Default {
            self.permission.set(self.answer);
        }
        Ok(self.permission.get())
    }

    async fn subscribe(&self, application_server_key: &[u8]) -> Result<Subscribed, FrontendError<Nothing>> {
        let reused = self.subscribed.replace(true) && is_reusable(self.key.borrow().as_deref(), application_server_key);
        let created = !reused;
        if created {
            *self.key.borrow_mut() = Some(application_server_key.to_vec());
        }
        Ok(Subscribed {
            subscription: subscription(),
            created,
        })
    }

    async fn unsubscribe(&self) -> Result<(), FrontendError<Nothing>> {
        self.subscribed.set(false);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FakeApi {
    pending: Option<PendingAlertsResponse>,
    fail_post: bool,
    posted: RefCell<Vec<String>>,
    checks: Cell<usize>,
}

impl FakeApi {
    pub fn with_pending(mut self, pending: PendingAlertsResponse) -> Self {
        self.pending = Some(pending);
        self
    }

    pub fn with_alerts(self, count: i64) -> Self {
        self.with_pending(PendingAlertsResponse {
            count,
            messages: vec!["Budget exceeded".to_string()],
        })
    }

    /// Checks fail as they would with the endpoint down
    pub fn failing_check(mut self) -> Self {
        self.pending = None;
        self
    }

    pub fn failing_post(mut self) -> Self {
        self.fail_post = true;
        self
    }

    pub fn posted(&self) -> Vec<String> {
        self.posted.borrow().clone()
    }

    pub fn checks(&self) -> usize {
        self.checks.get()
    }
}

impl Api for FakeApi {
    async fn post_subscription(
        &self,
        url: &str,
        _request: &UpdateSubscriptionRequest,
    ) -> Result<(), FrontendError<Nothing>> {
        if self.fail_post {
            return Err(FrontendError::Status {
                status: 500,
                url: url.to_string(),
            });
        }
        self.posted.borrow_mut().push(url.to_string());
        Ok(())
    }

    async fn pending_alerts(&self, url: &str) -> Result<PendingAlertsResponse, FrontendError<Nothing>> {
        self.checks.set(self.checks.get() + 1);
        self.pending.clone().ok_or_else(|| FrontendError::Client {
            message: format!("{url} unreachable"),
        })
    }
}

#[derive(Debug, Default)]
pub struct FakeUi {
    notices: RefCell<Vec<(String, NoticeLevel)>>,
    subscribed: Cell<bool>,
    hidden: Cell<bool>,
    badge: Cell<bool>,
    badges_added: Cell<usize>,
}

impl FakeUi {
    pub fn notices(&self) -> Vec<(String, NoticeLevel)> {
        self.notices.borrow().clone()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.get()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden.get()
    }

    pub fn badges_added(&self) -> usize {
        self.badges_added.get()
    }
}

impl PageUi for FakeUi {
    fn notice(&self, message: &str, level: NoticeLevel) {
        self.notices.borrow_mut().push((message.to_string(), level));
    }

    fn mark_subscribed(&self) {
        self.subscribed.set(true);
    }

    fn hide_opt_in(&self) {
        self.hidden.set(true);
    }

    fn has_alert_badge(&self) -> bool {
        self.badge.get()
    }

    fn add_alert_badge(&self) {
        self.badge.set(true);
        self.badges_added.set(self.badges_added.get() + 1);
    }
}

#[derive(Debug, Default)]
pub struct FakePage {
    pub push: FakePush,
    pub api: FakeApi,
    pub ui: FakeUi,
}

impl FakePage {
    pub fn with_push(mut self, push: FakePush) -> Self {
        self.push = push;
        self
    }

    pub fn with_api(mut self, api: FakeApi) -> Self {
        self.api = api;
        self
    }
}

impl Page for FakePage {
    type Push = FakePush;
    type Api = FakeApi;
    type Ui = FakeUi;

    fn push(&self) -> &FakePush {
        &self.push
    }

    fn api(&self) -> &FakeApi {
        &self.api
    }

    fn ui(&self) -> &FakeUi {
        &self.ui
    }
}
