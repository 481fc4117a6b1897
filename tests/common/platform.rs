//! wiremock stubs of the WeChat platform endpoints

use super::fixtures::{APP_ID, SECRET};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Access token the stub hands out
pub const TOKEN: &str = "ACCESS_TOKEN_1";

/// Serve access tokens, expecting exactly `calls` token requests
pub async fn mount_token(server: &MockServer, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/cgi-bin/token"))
        .and(query_param("grant_type", "client_credential"))
        .and(query_param("appid", APP_ID))
        .and(query_param("secret", SECRET))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": TOKEN,
            "expires_in": 7200
        })))
        .expect(calls)
        .named("access token")
        .mount(server)
        .await;
}

/// Answer `times` material uploads with `response` before later mocks apply
pub async fn mount_upload_once(server: &MockServer, response: ResponseTemplate, times: u64) {
    Mock::given(method("POST"))
        .and(path("/cgi-bin/material/add_material"))
        .respond_with(response)
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}

/// Accept material uploads with the given media id, expecting exactly `calls`
pub async fn mount_upload_success(server: &MockServer, media_id: &str, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/cgi-bin/material/add_material"))
        .and(query_param("access_token", TOKEN))
        .and(query_param("type", "image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "media_id": media_id,
            "url": format!("http://mmbiz.qpic.cn/{media_id}.png")
        })))
        .expect(calls)
        .named("add_material")
        .mount(server)
        .await;
}

/// A platform error body
pub fn platform_error(errcode: i64, errmsg: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "errcode": errcode,
        "errmsg": errmsg
    }))
}
