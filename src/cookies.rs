//! Cookie boundary
//!
//! The session layer never touches HTTP directly. It reads the session id
//! through a [`CookieSource`] and hands outgoing cookies to a [`CookieSink`];
//! transports adapt their request/response types to these traits.

use cookie::time::Duration;
use cookie::{Cookie, CookieJar};

/// Read access to the cookies of an incoming request
pub trait CookieSource {
    /// Value of the cookie called `name`, if present
    fn cookie_value(&self, name: &str) -> Option<String>;
}

/// Write access to the cookies of an outgoing response
pub trait CookieSink {
    fn add_cookie(&mut self, cookie: Cookie<'static>);
}

impl CookieSource for CookieJar {
    fn cookie_value(&self, name: &str) -> Option<String> {
        self.get(name).map(|c| c.value().to_string())
    }
}

impl CookieSink for CookieJar {
    fn add_cookie(&mut self, cookie: Cookie<'static>) {
        self.add(cookie);
    }
}

impl CookieSink for Vec<Cookie<'static>> {
    fn add_cookie(&mut self, cookie: Cookie<'static>) {
        self.push(cookie);
    }
}

/// Read the session id cookie, treating an empty value as absent
pub fn read_session_id(source: &impl CookieSource, name: &str) -> Option<String> {
    source.cookie_value(name).filter(|v| !v.is_empty())
}

/// Build the HttpOnly cookie that carries a session id
pub fn session_cookie(name: &str, sid: &str, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((name.to_string(), sid.to_string()))
        .http_only(true)
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

/// Build a cookie that tells the client to drop its session id
pub fn removal_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), String::new()))
        .http_only(true)
        .max_age(Duration::ZERO)
        .build()
}
