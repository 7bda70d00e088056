// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 详情页抓取器集成测试
///
/// 覆盖完整抓取、缺少发起人标签页、重试用尽以及瞬时失败后恢复等场景

#[cfg(test)]
mod tests {
    use crate::helpers::fixtures::*;
    use crate::helpers::mock_browser::{MockPage, MockSite};
    use rera_scraper::application::use_cases::detail_fetcher::{AttemptOutcome, DetailFetcher};
    use rera_scraper::domain::models::project_record::{ProjectRecord, NOT_AVAILABLE};
    use std::sync::Arc;

    fn fetcher(site: &Arc<MockSite>, max_retries: u32) -> DetailFetcher {
        DetailFetcher::new(site.factory(), quick_wait(), no_backoff(max_retries))
    }

    #[tokio::test]
    async fn test_fetch_full_detail_page() {
        let site = MockSite::new();
        let url = detail_url(1);
        site.add_page(
            &url,
            MockPage::new(project_with_promoter_tab("RP/19/2024/01234", "Sunrise Residency"))
                .with_click(promoter_panel(
                    "Kalinga Infra Pvt Ltd",
                    "Plot 12, Saheed Nagar, Bhubaneswar",
                    "21AABCK1234L1Z2",
                )),
        );

        let record = fetcher(&site, 2).fetch(&url, 1).await;

        assert_eq!(
            record,
            ProjectRecord::new(
                "RP/19/2024/01234",
                "Sunrise Residency",
                "Kalinga Infra Pvt Ltd",
                "Plot 12, Saheed Nagar, Bhubaneswar",
                "21AABCK1234L1Z2",
            )
        );
        assert_eq!(site.sessions_created(), 1);
        assert_eq!(site.sessions_closed(), 1);
    }

    #[tokio::test]
    async fn test_missing_promoter_tab_yields_not_available() {
        let site = MockSite::new();
        let url = detail_url(2);
        site.add_page(
            &url,
            MockPage::new(project_overview("RP/19/2024/00002", "Green Acres")),
        );

        let record = fetcher(&site, 2).fetch(&url, 2).await;

        assert_eq!(record.registration_number(), "RP/19/2024/00002");
        assert_eq!(record.project_name(), "Green Acres");
        assert_eq!(record.promoter_name(), NOT_AVAILABLE);
        assert_eq!(record.promoter_address(), NOT_AVAILABLE);
        assert_eq!(record.gst_number(), NOT_AVAILABLE);
        // A missing tab is not a failed attempt
        assert_eq!(site.navigations(&url), 1);
    }

    #[tokio::test]
    async fn test_unreachable_page_exhausts_retries() {
        let site = MockSite::new();
        let url = detail_url(3);
        site.add_page(&url, MockPage::unreachable());

        let record = fetcher(&site, 2).fetch(&url, 3).await;

        assert!(record.is_error());
        assert_eq!(site.navigations(&url), 3);
        assert_eq!(site.sessions_created(), 3);
        assert_eq!(site.sessions_closed(), site.sessions_created());
    }

    #[tokio::test]
    async fn test_transient_failure_recovers() {
        let site = MockSite::new();
        let url = detail_url(4);
        site.add_page(
            &url,
            MockPage::new(project_overview("RP/19/2024/00004", "Lake View"))
                .failing_first(1),
        );

        let record = fetcher(&site, 2).fetch(&url, 4).await;

        assert!(!record.is_error());
        assert_eq!(record.project_name(), "Lake View");
        assert_eq!(site.navigations(&url), 2);
        assert_eq!(site.sessions_closed(), 2);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let site = MockSite::new();
        let url = detail_url(5);
        site.add_page(&url, MockPage::unreachable());

        let record = fetcher(&site, 0).fetch(&url, 5).await;

        assert!(record.is_error());
        assert_eq!(site.navigations(&url), 1);
    }

    #[tokio::test]
    async fn test_page_without_labels_is_a_failed_attempt() {
        let site = MockSite::new();
        let url = detail_url(6);
        site.add_page(
            &url,
            MockPage::new("<html><body><h1>Service Unavailable</h1></body></html>"),
        );

        let record = fetcher(&site, 1).fetch(&url, 6).await;

        assert!(record.is_error());
        assert_eq!(site.navigations(&url), 2);
    }

    #[tokio::test]
    async fn test_launch_failure_is_retried_then_exhausted() {
        let site = MockSite::new();
        site.fail_launches();
        let fetcher = fetcher(&site, 1);

        match fetcher.attempt(&detail_url(7), 7, 0).await {
            AttemptOutcome::Retryable(e) => assert!(e.to_string().contains("launch")),
            other => panic!("expected retryable outcome, got {:?}", other),
        }
        assert!(matches!(
            fetcher.attempt(&detail_url(7), 7, 1).await,
            AttemptOutcome::Exhausted(_)
        ));
        assert_eq!(site.sessions_created(), 0);
    }
}
