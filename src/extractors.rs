use axum::extract::{FromRequestParts, Path};
use axum::http::header;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use std::convert::Infallible;
use url::form_urlencoded;

use crate::error::AppError;

pub const FLASH_COOKIE: &str = "shutterfeed_flash";

/// One-shot notice carried across a redirect in a cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashMessage {
    pub level: String,
    pub message: String,
}

impl FlashMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            level: "danger".to_string(),
            message: message.into(),
        }
    }

    fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("level", &self.level)
            .append_pair("message", &self.message)
            .finish()
    }

    fn decode(value: &str) -> Option<Self> {
        let mut level = None;
        let mut message = None;
        for (key, val) in form_urlencoded::parse(value.as_bytes()) {
            match key.as_ref() {
                "level" => level = Some(val.into_owned()),
                "message" => message = Some(val.into_owned()),
                _ => {}
            }
        }
        Some(Self {
            level: level?,
            message: message?,
        })
    }

    pub fn set_cookie(&self) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/",
            FLASH_COOKIE,
            self.encode()
        )
    }
}

pub fn clear_flash_cookie() -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", FLASH_COOKIE)
}

/// 303 redirect that leaves a flash message for the next page.
pub fn redirect_with_flash(to: &str, flash: FlashMessage) -> Response {
    (
        [(header::SET_COOKIE, flash.set_cookie())],
        Redirect::to(to),
    )
        .into_response()
}

/// Pending flash message, if the previous response left one.
/// Whoever renders it is responsible for clearing the cookie.
pub struct Flash(pub Option<FlashMessage>);

impl Flash {
    pub fn messages(&self) -> Vec<FlashMessage> {
        self.0.iter().cloned().collect()
    }

    /// Attach the cookie-clearing header when a message was consumed.
    pub fn consume(&self, response: impl IntoResponse) -> Response {
        if self.0.is_some() {
            ([(header::SET_COOKIE, clear_flash_cookie())], response).into_response()
        } else {
            response.into_response()
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Flash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Flash(
            cookie_value(parts, FLASH_COOKIE).and_then(FlashMessage::decode),
        ))
    }
}

/// Value of the `Referer` header, if present and valid UTF-8.
pub struct Referrer(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for Referrer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let referrer = parts
            .headers
            .get(header::REFERER)
            .and_then(|h| h.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Ok(Referrer(referrer))
    }
}

/// Post id from the `{id}` path segment. Anything other than a plain
/// non-negative integer names no post, so it is rejected as 404.
pub struct PostId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for PostId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound)?;
        parse_post_id(&raw).map(PostId).ok_or(AppError::NotFound)
    }
}

fn parse_post_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    fn parts_with_headers(headers: &[(header::HeaderName, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn flash_survives_cookie_encoding() {
        let flash = FlashMessage::danger("Invalid file type. Allowed types: png, jpg; gif");
        let encoded = flash.encode();
        assert!(!encoded.contains(';'));
        assert!(!encoded.contains(' '));
        assert_eq!(FlashMessage::decode(&encoded), Some(flash));
    }

    #[test]
    fn decode_requires_both_fields() {
        assert_eq!(FlashMessage::decode("level=success"), None);
        assert_eq!(FlashMessage::decode("garbage"), None);
    }

    #[tokio::test]
    async fn flash_extractor_reads_cookie() {
        let flash = FlashMessage::success("Your post has been created!");
        let cookie = format!("other=1; {}={}", FLASH_COOKIE, flash.encode());
        let mut parts = parts_with_headers(&[(header::COOKIE, cookie.as_str())]);

        let Flash(found) = Flash::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found, Some(flash));
    }

    #[tokio::test]
    async fn flash_extractor_ignores_cleared_cookie() {
        let cookie = format!("{}=", FLASH_COOKIE);
        let mut parts = parts_with_headers(&[(header::COOKIE, cookie.as_str())]);

        let Flash(found) = Flash::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn consume_clears_cookie_only_when_present() {
        let with = Flash(Some(FlashMessage::success("hi"))).consume(StatusCode::OK);
        let cleared = with.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));

        let without = Flash(None).consume(StatusCode::OK);
        assert!(without.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn redirect_with_flash_sets_cookie_and_location() {
        let response = redirect_with_flash("/create", FlashMessage::danger("No image file selected"));
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/create");
        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("shutterfeed_flash=level=danger&message=No+image+file+selected"));
    }

    #[tokio::test]
    async fn referrer_extractor() {
        let mut parts = parts_with_headers(&[(header::REFERER, "http://localhost/post/3")]);
        let Referrer(found) = Referrer::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found.as_deref(), Some("http://localhost/post/3"));

        let mut parts = parts_with_headers(&[]);
        let Referrer(found) = Referrer::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn post_id_accepts_only_plain_integers() {
        assert_eq!(parse_post_id("42"), Some(42));
        assert_eq!(parse_post_id("007"), Some(7));
        assert_eq!(parse_post_id("abc"), None);
        assert_eq!(parse_post_id(""), None);
        assert_eq!(parse_post_id("-1"), None);
        assert_eq!(parse_post_id("+1"), None);
        assert_eq!(parse_post_id("1.5"), None);
        assert_eq!(parse_post_id("99999999999999999999"), None);
    }
}
