//! Property-based tests for notification validation

use chrono::{Duration, Utc};
use parttime_comms::shared::notification::truncate_chars;
use parttime_comms::shared::{Notification, NotificationDraft, NotificationType};
use proptest::prelude::*;
use uuid::Uuid;

fn draft(title: &str, message: &str) -> NotificationDraft {
    NotificationDraft::new(Uuid::new_v4(), NotificationType::System, title, message)
}

proptest! {
    #[test]
    fn test_bounded_drafts_validate(
        title in "[a-zA-Z0-9 ]{0,99}[a-zA-Z0-9]",
        message in "[^\\s]{1,500}",
    ) {
        prop_assert!(draft(&title, &message).validate().is_ok());
    }

    #[test]
    fn test_long_titles_are_rejected(title in "[a-z\u{e9}\u{1F600}]{101,140}") {
        prop_assert!(draft(&title, "body").validate().is_err());
    }

    #[test]
    fn test_blank_fields_are_rejected(blank in "[ \t\n]{0,8}") {
        prop_assert!(draft(&blank, "body").validate().is_err());
        prop_assert!(draft("title", &blank).validate().is_err());
    }

    #[test]
    fn test_truncate_respects_char_bound(value in "\\PC{0,300}", max in 3usize..200) {
        let cut = truncate_chars(&value, max);
        prop_assert!(cut.chars().count() <= max);
        if value.chars().count() <= max {
            prop_assert_eq!(cut, value);
        } else {
            prop_assert!(cut.ends_with("..."));
            let kept = cut.trim_end_matches("...");
            prop_assert!(value.starts_with(kept));
        }
    }

    #[test]
    fn test_read_at_is_set_once(first in 0i64..10_000, second in 0i64..10_000) {
        let created = Utc::now();
        let mut notification = Notification::from_draft(draft("Shift", "Tomorrow"), created);
        prop_assert!(notification.read_at.is_none());

        let first_read = created + Duration::seconds(first);
        prop_assert!(notification.mark_read(first_read));
        prop_assert!(!notification.mark_read(first_read + Duration::seconds(second)));
        prop_assert!(notification.is_read);
        prop_assert_eq!(notification.read_at, Some(first_read));
    }
}
