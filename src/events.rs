use std::collections::HashSet;

use serde_json::Value;

/// OS event codes from the glasses firmware (pilot build mapping).
pub const OS_CLICK: i64 = 0;
pub const OS_SCROLL_BOTTOM: i64 = 1; // swipe down
pub const OS_SCROLL_TOP: i64 = 2; // swipe up
pub const OS_FOREGROUND_ENTER: i64 = 4;
pub const OS_FOREGROUND_EXIT: i64 = 5;

/// Tap arrives as CLICK on most devices; 13 observed on some firmware revisions.
pub const TAP_FALLBACK_CODE: i64 = 13;

/// Abstract gesture/lifecycle intent, decoded from a raw device payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Tap,
    SwipeUp,
    SwipeDown,
    ForegroundEnter,
    ForegroundExit,
}

/// Pull the numeric event code out of a raw hub payload.
///
/// Payloads come in several envelopes depending on which container captured
/// the gesture; the code itself may be a JSON number or a numeric string.
/// Anything unparseable yields `None` (a no-op event).
pub fn extract_event_code(payload: &Value) -> Option<i64> {
    const ENVELOPES: [&[&str]; 5] = [
        &["textEvent", "eventType"],
        &["listEvent", "eventType"],
        &["sysEvent", "eventType"],
        &["jsonData", "sysEvent", "eventType"],
        &["jsonData", "eventType"],
    ];
    for path in ENVELOPES {
        let mut node = payload;
        let mut found = true;
        for key in path {
            match node.get(key) {
                Some(next) => node = next,
                None => {
                    found = false;
                    break;
                }
            }
        }
        if found {
            return parse_code(node);
        }
    }
    None
}

fn parse_code(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Maps raw event codes to intents, with a configurable set of codes all
/// treated as tap.
#[derive(Debug, Clone)]
pub struct Classifier {
    tap_codes: HashSet<i64>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            tap_codes: [OS_CLICK, TAP_FALLBACK_CODE].into_iter().collect(),
        }
    }

    pub fn with_tap_codes(codes: impl IntoIterator<Item = i64>) -> Self {
        Self {
            tap_codes: codes.into_iter().collect(),
        }
    }

    pub fn classify_code(&self, code: i64) -> Option<Intent> {
        match code {
            OS_SCROLL_BOTTOM => Some(Intent::SwipeDown),
            OS_SCROLL_TOP => Some(Intent::SwipeUp),
            OS_FOREGROUND_ENTER => Some(Intent::ForegroundEnter),
            OS_FOREGROUND_EXIT => Some(Intent::ForegroundExit),
            c if self.tap_codes.contains(&c) => Some(Intent::Tap),
            _ => None,
        }
    }

    pub fn classify(&self, payload: &Value) -> Option<Intent> {
        self.classify_code(extract_event_code(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_extracts_from_each_envelope() {
        let cases = [
            json!({"textEvent": {"eventType": 0}}),
            json!({"listEvent": {"eventType": 0}}),
            json!({"sysEvent": {"eventType": 0}}),
            json!({"jsonData": {"sysEvent": {"eventType": 0}}}),
            json!({"jsonData": {"eventType": 0}}),
        ];
        for payload in &cases {
            assert_eq!(extract_event_code(payload), Some(0), "{payload}");
        }
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let payload = json!({"sysEvent": {"eventType": " 13 "}});
        assert_eq!(extract_event_code(&payload), Some(13));
    }

    #[test]
    fn test_malformed_payload_is_no_event() {
        let c = Classifier::new();
        assert_eq!(c.classify(&json!({})), None);
        assert_eq!(c.classify(&json!({"sysEvent": {"eventType": "abc"}})), None);
        assert_eq!(c.classify(&json!({"sysEvent": {"eventType": null}})), None);
        assert_eq!(c.classify(&json!({"sysEvent": {"eventType": [1]}})), None);
    }

    #[test]
    fn test_tap_fallback_codes() {
        let c = Classifier::new();
        assert_matches!(c.classify_code(OS_CLICK), Some(Intent::Tap));
        assert_matches!(c.classify_code(TAP_FALLBACK_CODE), Some(Intent::Tap));
        assert_eq!(c.classify_code(99), None);
    }

    #[test]
    fn test_custom_tap_codes() {
        let c = Classifier::with_tap_codes([0, 13, 17]);
        assert_matches!(c.classify_code(17), Some(Intent::Tap));
    }

    #[test]
    fn test_swipe_and_foreground_codes() {
        let c = Classifier::new();
        assert_matches!(c.classify_code(OS_SCROLL_TOP), Some(Intent::SwipeUp));
        assert_matches!(c.classify_code(OS_SCROLL_BOTTOM), Some(Intent::SwipeDown));
        assert_matches!(c.classify_code(OS_FOREGROUND_ENTER), Some(Intent::ForegroundEnter));
        assert_matches!(c.classify_code(OS_FOREGROUND_EXIT), Some(Intent::ForegroundExit));
    }

    #[test]
    fn test_classify_full_payload() {
        let c = Classifier::new();
        let payload = json!({"listEvent": {"eventType": 2}});
        assert_matches!(c.classify(&payload), Some(Intent::SwipeUp));
    }
}
