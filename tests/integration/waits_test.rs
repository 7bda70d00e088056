// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 有界等待测试

#[cfg(test)]
mod tests {
    use crate::helpers::fixtures::*;
    use crate::helpers::mock_browser::{MockPage, MockSite};
    use rera_scraper::engines::locator::Locator;
    use rera_scraper::engines::traits::{BrowserSession, EngineError, SessionFactory};
    use std::time::Instant;

    #[tokio::test]
    async fn test_until_present_returns_match_count() {
        let site = MockSite::new();
        site.add_page(LISTING_URL, MockPage::new(listing_page(4)));
        let mut session = site.factory().create().await.unwrap();
        session.navigate(LISTING_URL).await.unwrap();

        let found = quick_wait()
            .until_present(&*session, &Locator::link_text("View Details"))
            .await
            .unwrap();

        assert_eq!(found, 4);
        session.quit().await.unwrap();
    }

    #[tokio::test]
    async fn test_until_present_times_out() {
        let site = MockSite::new();
        site.add_page(LISTING_URL, MockPage::new(listing_page(0)));
        let session = site.factory().create().await.unwrap();
        session.navigate(LISTING_URL).await.unwrap();

        let err = quick_wait()
            .until_present(&*session, &Locator::link_text("View Details"))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(err.to_string().contains("View Details"));
    }

    #[tokio::test]
    async fn test_until_clickable_finds_promoter_tab() {
        let site = MockSite::new();
        let url = detail_url(1);
        site.add_page(&url, MockPage::new(project_with_promoter_tab("RP-1", "Tower")));
        let session = site.factory().create().await.unwrap();
        session.navigate(&url).await.unwrap();

        let wait = quick_wait();
        assert!(wait
            .until_clickable(&*session, &Locator::link_text("Promoter Details"))
            .await
            .is_ok());
        assert!(wait
            .until_clickable(&*session, &Locator::list_item_link_text("Promoter"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_session_errors_are_not_polled() {
        let site = MockSite::new();
        let session = site.factory().create().await.unwrap();

        // Nothing loaded yet, so every query fails outright
        let started = Instant::now();
        let err = quick_wait()
            .until_present(&*session, &Locator::tag("label"))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Other(_)));
        assert!(started.elapsed() < quick_wait().timeout());
    }
}
