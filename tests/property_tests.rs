//! Property-based tests using proptest
//! Tests invariants that should hold for all inputs
use proptest::prelude::*;
use serde_json::json;
use std::time::Duration;

use intake_api::rate_limit::{step, RateDecision, WindowState};
use intake_api::spam::SpamScanner;
use intake_api::validation::{is_valid_email, validate};

// Property: email validation should never panic
proptest! {
    #[test]
    fn email_validation_never_panics(email in "\\PC*") {
        let _ = is_valid_email(&email);
    }

    #[test]
    fn well_formed_emails_accepted(
        local in "[a-z][a-z0-9]{0,10}",
        domain in "[a-z][a-z0-9]{1,10}",
        tld in "[a-z]{2,4}"
    ) {
        let email = format!("{}@{}.{}", local, domain, tld);
        prop_assert!(is_valid_email(&email));
    }
}

// Property: schema validation should never panic, whatever the field contents
proptest! {
    #[test]
    fn validation_never_panics(
        name in "\\PC*",
        email in "\\PC*",
        vision in "\\PC*",
        tts in proptest::num::f64::ANY
    ) {
        let payload = json!({
            "fullName": name,
            "email": email,
            "industry": "Retail",
            "teamSize": "1–5",
            "dataSensitivity": "Low",
            "budgetRange": "<$5k",
            "projectUrgency": "Exploring",
            "vision": vision,
            "tts": tts
        });
        let _ = validate(&payload);
    }

    #[test]
    fn vision_length_bounds_enforced(len in 0usize..2000) {
        let payload = json!({
            "fullName": "Jane Doe",
            "email": "jane@x.com",
            "industry": "Retail",
            "teamSize": "1–5",
            "dataSensitivity": "Low",
            "budgetRange": "<$5k",
            "projectUrgency": "Exploring",
            "vision": "x".repeat(len),
            "tts": 12
        });
        let accepted = validate(&payload).is_ok();
        prop_assert_eq!(accepted, (20..=1500).contains(&len));
    }
}

// Property: the spam scanner should never panic and always flags links
proptest! {
    #[test]
    fn spam_scan_never_panics(text in "\\PC*") {
        let _ = SpamScanner::new().scan_text(&text);
    }

    #[test]
    fn embedded_links_always_flagged(domain in "[a-z]{3,12}") {
        let text = format!("please visit https://{}.com for details", domain);
        prop_assert!(SpamScanner::new().scan_text(&text).is_some());
    }
}

// Property: a fixed window admits exactly `max` requests
proptest! {
    #[test]
    fn window_admits_exactly_max(max in 1u32..50, extra in 0u32..20) {
        let window = Duration::from_secs(600);
        let now_ms = 1_700_000_000_000i64;
        let mut state: Option<WindowState> = None;
        let mut allowed = 0u32;

        for _ in 0..(max + extra) {
            let (next, decision) = step(state, now_ms, max, window);
            if decision.is_allowed() {
                allowed += 1;
                state = Some(next);
            }
        }

        prop_assert_eq!(allowed, max);
    }

    #[test]
    fn window_reset_restores_allowance(max in 1u32..20) {
        let window = Duration::from_secs(600);
        let start_ms = 1_700_000_000_000i64;

        // Exhaust the window
        let mut state: Option<WindowState> = None;
        for _ in 0..max {
            let (next, decision) = step(state, start_ms, max, window);
            prop_assert!(decision.is_allowed());
            state = Some(next);
        }
        let (_, decision) = step(state, start_ms, max, window);
        prop_assert!(!decision.is_allowed());

        // One millisecond past expiry a fresh window opens
        let after_ms = start_ms + window.as_millis() as i64 + 1;
        let (fresh, decision) = step(state, after_ms, max, window);
        prop_assert!(decision.is_allowed());
        prop_assert_eq!(fresh.count, 1);
    }

    #[test]
    fn limited_requests_report_positive_retry_delay(
        count_over in 0u32..5,
        elapsed_ms in 0i64..599_000
    ) {
        let window = Duration::from_secs(600);
        let now_ms = 1_700_000_000_000i64;
        let max = 5u32;
        let state = WindowState {
            count: max + count_over,
            reset_at_ms: now_ms + (600_000 - elapsed_ms),
        };

        match step(Some(state), now_ms, max, window).1 {
            RateDecision::Limited { retry_after_secs } => {
                prop_assert!(retry_after_secs >= 1);
                prop_assert!(retry_after_secs <= 600);
            }
            RateDecision::Allowed => prop_assert!(false, "full window must deny"),
        }
    }
}
