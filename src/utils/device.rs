//! User-agent sniffing

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static MOBILE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"AppleWebKit.*Mobile.*").unwrap());
static IOS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(i[^;]+;( U;)? CPU.+Mac OS X").unwrap());

/// What a user-agent string says about the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub mobile: bool,
    pub ios: bool,
    /// Also set for plain Linux agents and UC browser
    pub android: bool,
    pub iphone: bool,
    pub ipad: bool,
    /// WeChat's in-app browser, excluding WeCom
    pub wechat: bool,
    /// WeCom (enterprise WeChat)
    pub wechat_work: bool,
    pub chrome: bool,
}

impl DeviceInfo {
    pub fn from_user_agent(user_agent: &str) -> Self {
        let micro_messenger = user_agent.contains("MicroMessenger");
        let wxwork = user_agent.contains("wxwork");

        Self {
            mobile: MOBILE.is_match(user_agent),
            ios: IOS.is_match(user_agent),
            android: user_agent.contains("Android") || user_agent.contains("Linux"),
            iphone: user_agent.contains("iPhone"),
            ipad: user_agent.contains("iPad"),
            wechat: micro_messenger && !wxwork,
            wechat_work: micro_messenger && wxwork,
            chrome: user_agent.contains("Chrome"),
        }
    }

    /// Any of the handset/tablet signals
    pub fn is_mobile(&self) -> bool {
        self.mobile || self.ios || self.android || self.iphone || self.ipad
    }
}
