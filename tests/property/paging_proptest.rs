//! Property-based tests for notification paging

use std::collections::HashSet;

use parttime_comms::backend::{AppState, ServerConfig};
use parttime_comms::shared::Pagination;
use proptest::prelude::*;
use uuid::Uuid;

proptest! {
    #[test]
    fn test_pagination_flags(page in 1u32..50, limit in 1u32..=100, total in 0u64..5_000) {
        let p = Pagination::new(page, limit, total);
        prop_assert!(u64::from(p.total_pages) * u64::from(limit) >= total);
        prop_assert_eq!(p.has_next, page < p.total_pages);
        prop_assert_eq!(p.has_prev, page > 1);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_pages_cover_every_notification_once(count in 0usize..40, limit in 1u32..12, read in 0usize..40) {
        tokio_test::block_on(async {
            let state = AppState::in_memory(ServerConfig::default());
            let service = &state.notifications;
            let user = Uuid::new_v4();

            let mut created = Vec::new();
            for i in 0..count {
                let notification = service
                    .create_system_notification(user, &format!("Notice {}", i), "Body", None, None)
                    .await
                    .unwrap();
                created.push(notification.id);
            }
            for id in created.iter().take(read) {
                service.mark_as_read(*id, user).await.unwrap();
            }
            let unread = count.saturating_sub(read) as u64;

            let mut seen = Vec::new();
            let mut page = 1;
            loop {
                let result = service.get_user_notifications(user, page, limit, false).await.unwrap();
                prop_assert_eq!(result.total, count as u64);
                prop_assert_eq!(result.unread_count, unread);
                if result.notifications.is_empty() {
                    break;
                }
                prop_assert!(result.notifications.len() <= limit as usize);
                seen.extend(result.notifications);
                page += 1;
            }

            prop_assert_eq!(seen.len(), count);
            let ids: HashSet<Uuid> = seen.iter().map(|n| n.id).collect();
            prop_assert_eq!(ids.len(), count);
            for pair in seen.windows(2) {
                prop_assert!((pair[0].created_at, pair[0].id) >= (pair[1].created_at, pair[1].id));
            }

            let unread_only = service.get_user_notifications(user, 1, 100, true).await.unwrap();
            prop_assert_eq!(unread_only.notifications.len() as u64, unread);
            prop_assert_eq!(unread_only.total, unread);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
