//! Image URL Plumbing
//!
//! Rewrites known share-link patterns into direct-fetch URLs and builds the
//! thumbnail fallback chain. The order is fixed: direct URL, then the
//! Microlink unfurl service, then a static placeholder.

use std::sync::OnceLock;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use regex::Regex;

/// Shown when both the direct URL and the unfurl service fail
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/128x128?text=No+Image";

fn drive_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"drive\.google\.com/file/d/([^/?]+)").expect("valid pattern")
    })
}

/// Rewrite known share links into direct-fetch URLs:
/// Google Drive "file view" links and Dropbox "shareable" links.
/// Anything else passes through unchanged.
pub fn normalize_image_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    if let Some(caps) = drive_file_re().captures(url) {
        return format!("https://drive.google.com/uc?export=view&id={}", &caps[1]);
    }
    if url.contains("dropbox.com") && url.contains("dl=0") {
        return url.replace("dl=0", "raw=1");
    }
    url.to_string()
}

/// Second stage of the fallback chain: ask Microlink to extract a
/// representative image from the page behind `url`.
pub fn unfurl_fallback_url(url: &str) -> String {
    format!(
        "https://api.microlink.io/?url={}&embed=image.url",
        utf8_percent_encode(url, NON_ALPHANUMERIC)
    )
}

/// The full thumbnail candidate chain, in the order a renderer should try
/// them: direct URL, unfurl URL, placeholder.
pub fn image_candidates(url: &str) -> Vec<String> {
    if url.is_empty() {
        return vec![PLACEHOLDER_IMAGE.to_string()];
    }
    vec![
        normalize_image_url(url),
        unfurl_fallback_url(url),
        PLACEHOLDER_IMAGE.to_string(),
    ]
}
