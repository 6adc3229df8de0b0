//! Custom endpoint uploader: POSTs the capture to a user-configured URL.
//!
//! Wire format: `multipart/form-data` with a single `image` part
//! (`image/png`, filename `screenshot.png`). The response is parsed by
//! [`super::response`]. There is no timeout and no retry; a failed upload
//! leaves its message in the view and the user starts a new one.

use super::response::{parse_image_url, response_snippet};
use super::session::UploadSession;
use super::{Provider, UploadError};
use crate::history::{encode_token, History, MAX_FILE_NAME_BYTES};
use chrono::{DateTime, Local};
use reqwest::multipart::{Form, Part};

pub const FORM_FIELD: &str = "image";
pub const UPLOAD_FILE_NAME: &str = "screenshot.png";
pub const UPLOAD_CONTENT_TYPE: &str = "image/png";
pub const DELETE_UNSUPPORTED_TEXT: &str = "Image deletion is not supported for custom uploads";

pub struct CustomUploader {
    client: reqwest::Client,
    endpoint: String,
}

impl CustomUploader {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Uploads the session's capture and drives the session to a terminal
    /// state. Never returns an error; failures end up in the view.
    pub async fn upload(&self, session: &mut UploadSession) {
        if session.state().is_terminal() {
            log::warn!(
                "[UPLOAD] Upload already finished for this capture; start a new one to retry"
            );
            return;
        }

        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            session.fail(UploadError::NotConfigured);
            return;
        }

        let Some(png) = session.capture().png_bytes().map(<[u8]>::to_vec) else {
            session.fail(UploadError::EmptyCapture);
            return;
        };

        session.begin_upload();
        let start = std::time::Instant::now();
        log::info!("[UPLOAD] POST {} ({} bytes)", endpoint, png.len());

        match self.post_png(endpoint, png).await {
            Ok(url) => {
                log::info!(
                    "[UPLOAD] Uploaded in {}ms: {}",
                    start.elapsed().as_millis(),
                    url
                );
                self.finish(session, url).await;
            }
            Err(e) => session.fail(e),
        }
    }

    /// Remote deletion isn't implemented for this provider; the user is told
    /// so and nothing is sent.
    pub fn delete_image(&self, session: &mut UploadSession, file_name: &str, _delete_token: &str) {
        log::info!("[UPLOAD] Delete requested for '{}' (unsupported)", file_name);
        session.notify(DELETE_UNSUPPORTED_TEXT);
    }

    async fn post_png(&self, endpoint: &str, png: Vec<u8>) -> Result<String, UploadError> {
        let part = Part::bytes(png)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(UPLOAD_CONTENT_TYPE)
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let form = Form::new().part(FORM_FIELD, part);

        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| UploadError::Transport(e.to_string()))?;

        let body = response.bytes().await.map_err(|e| {
            log::warn!("[UPLOAD] Reading response body failed: {}", e);
            UploadError::InvalidResponse
        })?;

        parse_image_url(&body).ok_or_else(|| UploadError::UnparseableResponse {
            snippet: response_snippet(&body),
        })
    }

    async fn finish(&self, session: &mut UploadSession, url: String) {
        session.copy_text_quietly(&url);

        let tag = Provider::Custom.as_str();
        let token = encode_token(&url);
        let display = display_name_for_url(&url, Local::now());

        let packed = match History::fit_display_name(tag, &token, &display) {
            Some(file) => {
                if file != display {
                    log::info!(
                        "[HISTORY] Display name shortened to fit {} bytes: {}",
                        MAX_FILE_NAME_BYTES,
                        file
                    );
                }
                let packed = History::pack_file_name(tag, &token, &file);
                let history = session.history().clone();
                let png = session
                    .capture()
                    .png_bytes()
                    .map(<[u8]>::to_vec)
                    .unwrap_or_default();
                record_history(history, png, packed.clone()).await;
                packed
            }
            None => {
                log::warn!(
                    "[HISTORY] Not recording upload: URL too long for a {}-byte file name",
                    MAX_FILE_NAME_BYTES
                );
                History::pack_file_name(tag, &token, &display)
            }
        };

        session.succeed(url, packed);
    }
}

/// Writes the capture to the history store off the async runtime. Failures
/// are logged and don't affect the upload result.
async fn record_history(history: History, png: Vec<u8>, packed: String) {
    match tokio::task::spawn_blocking(move || history.save(&png, &packed)).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => log::warn!("[HISTORY] Could not record upload: {}", e),
        Err(e) => log::error!("[HISTORY] History task failed: {}", e),
    }
}

/// Display name for a history entry: the URL's last path segment, or
/// `screenshot_<YYYYMMDD_HHmmss>` when there is none, with `.png` appended
/// when the name has no extension.
///
/// The segment is percent-decoded; a segment that decodes to something
/// containing a path separator is not usable as a file name and is ignored.
pub fn display_name_for_url(url: &str, now: DateTime<Local>) -> String {
    let segment = reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .map(decode_segment)
        })
        .filter(|s| !s.is_empty() && !s.contains(['/', '\\']));

    let mut name =
        segment.unwrap_or_else(|| format!("screenshot_{}", now.format("%Y%m%d_%H%M%S")));
    if !name.contains('.') {
        name.push_str(".png");
    }
    name
}

fn decode_segment(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(decoded) => decoded.into_owned(),
        // Not valid UTF-8 once decoded: keep the encoded form.
        Err(_) => segment.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn name_from_last_segment() {
        assert_eq!(display_name_for_url("http://x/s/abc.png", fixed_now()), "abc.png");
    }

    #[test]
    fn extension_appended_when_missing() {
        assert_eq!(display_name_for_url("http://x/s/abc", fixed_now()), "abc.png");
    }

    #[test]
    fn timestamp_when_no_segment() {
        assert_eq!(
            display_name_for_url("http://x/", fixed_now()),
            "screenshot_20260314_092653.png"
        );
        assert_eq!(
            display_name_for_url("http://x", fixed_now()),
            "screenshot_20260314_092653.png"
        );
    }

    #[test]
    fn query_is_not_part_of_the_name() {
        assert_eq!(
            display_name_for_url("https://x/i/cat.jpeg?size=large", fixed_now()),
            "cat.jpeg"
        );
    }

    #[test]
    fn segment_is_percent_decoded() {
        assert_eq!(
            display_name_for_url("http://x/s/my%20shot", fixed_now()),
            "my shot.png"
        );
        assert_eq!(
            display_name_for_url("http://x/s/caf%C3%A9.png", fixed_now()),
            "café.png"
        );
    }

    #[test]
    fn encoded_separators_are_not_used_as_names() {
        assert_eq!(
            display_name_for_url("http://x/s/a%2Fb.png", fixed_now()),
            "screenshot_20260314_092653.png"
        );
        assert_eq!(
            display_name_for_url("http://x/s/a%5Cb", fixed_now()),
            "screenshot_20260314_092653.png"
        );
    }

    #[test]
    fn invalid_utf8_escape_keeps_encoded_segment() {
        assert_eq!(display_name_for_url("http://x/s/a%FF", fixed_now()), "a%FF.png");
    }

    #[test]
    fn unparseable_url_uses_timestamp() {
        assert_eq!(
            display_name_for_url("not a url", fixed_now()),
            "screenshot_20260314_092653.png"
        );
    }

    #[test]
    fn endpoint_is_kept_verbatim() {
        let uploader = CustomUploader::new("http://localhost:4000/upload");
        assert_eq!(uploader.endpoint(), "http://localhost:4000/upload");
    }
}
