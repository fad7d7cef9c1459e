use std::sync::Arc;

use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vesta_core::adapters::HttpListingsLookup;
use vesta_core::config::FlowConfig;
use vesta_core::flow::{
    FlowPhase, GuidedFlow, ACTION_INQUIRE, ACTION_MAIN_MENU, LOOKUP_FAILED_REPLY, NO_RESULTS_REPLY,
};
use vesta_core::models::ListingStatus;

fn listing_json(title: &str, slug: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "price": 4_500_000.0,
        "images": ["https://cdn.test/first.jpg"],
        "address": "Osmena Blvd",
        "city": "Cebu City",
        "state": "Cebu",
        "country": "Philippines",
        "bedrooms": 2,
        "bathrooms": 1,
        "type": "Condominium",
        "status": "For Rent",
        "slug": slug
    })
}

async fn flow_against(server: &MockServer) -> GuidedFlow {
    let lookup = HttpListingsLookup::new(server.uri());
    let config = FlowConfig {
        site_base_url: "https://homes.test".to_string(),
        max_results: 3,
    };
    GuidedFlow::new(Arc::new(lookup), config)
}

mod traversal_tests {
    use super::*;

    #[tokio::test]
    async fn test_full_refinement_traversal() {
        let server = MockServer::start().await;

        // Status chosen, no city yet.
        Mock::given(method("GET"))
            .and(path("/properties"))
            .and(query_param("status", "for-rent"))
            .and(query_param_is_missing("city"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                listing_json("Rental A", "rental-a"),
                listing_json("Rental B", "rental-b"),
            ])))
            .mount(&server)
            .await;

        // City refinement.
        Mock::given(method("GET"))
            .and(path("/properties"))
            .and(query_param("status", "for-rent"))
            .and(query_param("city", "Cebu"))
            .and(query_param_is_missing("maxPrice"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([listing_json("Rental A", "rental-a")])),
            )
            .mount(&server)
            .await;

        // Budget refinement carries every accumulated filter.
        Mock::given(method("GET"))
            .and(path("/properties"))
            .and(query_param("status", "for-rent"))
            .and(query_param("city", "Cebu"))
            .and(query_param("maxPrice", "5000000"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([listing_json("Rental A", "rental-a")])),
            )
            .mount(&server)
            .await;

        let mut flow = flow_against(&server).await;

        let replies = flow.handle_quick_action(ACTION_INQUIRE).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(flow.phase(), FlowPhase::AwaitingFilterChoice);

        let replies = flow.handle_quick_action("For Rent").await;
        assert_eq!(flow.phase(), FlowPhase::AwaitingCityText);
        let text = replies[0].text();
        assert!(text.contains("**1. Rental A**"));
        assert!(text.contains("**2. Rental B**"));
        assert!(text.contains("\u{20b1}4,500,000"));
        assert!(text.contains("![Rental A](https://cdn.test/first.jpg)"));
        assert!(text.contains("Condominium | For Rent | 2 BR | 1 BA"));
        assert!(text.contains("https://homes.test/properties/rental-a"));
        assert!(text.contains("https://homes.test/properties?status=for-rent"));

        let replies = flow.handle_free_text("Cebu").await.unwrap();
        assert_eq!(flow.phase(), FlowPhase::Refined);
        assert!(replies[0].text().contains("**1. Rental A**"));

        flow.handle_quick_action("Budget = 5000000").await;

        assert_eq!(flow.phase(), FlowPhase::Refined);
        assert_eq!(flow.filters().status, Some(ListingStatus::ForRent));
        assert_eq!(flow.filters().city.as_deref(), Some("Cebu"));
        assert_eq!(flow.filters().max_price, Some(5_000_000));
    }

    #[tokio::test]
    async fn test_main_menu_clears_accumulated_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/properties"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([listing_json("Any", "any")])),
            )
            .mount(&server)
            .await;

        let mut flow = flow_against(&server).await;
        flow.handle_quick_action(ACTION_INQUIRE).await;
        flow.handle_quick_action("For Sale").await;
        flow.handle_free_text("Mandaue").await;
        assert!(!flow.filters().is_empty());

        flow.handle_quick_action(ACTION_MAIN_MENU).await;
        assert_eq!(flow.phase(), FlowPhase::Idle);
        assert!(flow.filters().is_empty());
    }
}

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_zero_results_apology_keeps_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/properties"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let mut flow = flow_against(&server).await;
        flow.handle_quick_action(ACTION_INQUIRE).await;
        let filters_before = flow.filters().clone();

        let replies = flow.handle_quick_action("Preselling").await;

        assert!(replies[0].text().starts_with(NO_RESULTS_REPLY));
        assert_eq!(flow.phase(), FlowPhase::AwaitingFilterChoice);
        assert_eq!(flow.filters(), &filters_before);
    }

    #[tokio::test]
    async fn test_server_error_yields_generic_apology() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/properties"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut flow = flow_against(&server).await;
        flow.handle_quick_action(ACTION_INQUIRE).await;
        let replies = flow.handle_quick_action("For Sale").await;

        let text = replies[0].text();
        assert!(text.starts_with(LOOKUP_FAILED_REPLY));
        // The flow stays navigable: the same quick actions come back.
        assert!(text.contains("[CHOICES]"));
        assert!(text.contains("Main Menu"));
        assert_eq!(flow.phase(), FlowPhase::AwaitingFilterChoice);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_treated_as_no_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/properties"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("{\"unexpected\":\"shape\"}"),
            )
            .mount(&server)
            .await;

        let mut flow = flow_against(&server).await;
        flow.handle_quick_action(ACTION_INQUIRE).await;
        let replies = flow.handle_quick_action("For Sale").await;

        assert!(replies[0].text().starts_with(NO_RESULTS_REPLY));
        assert!(flow.filters().is_empty());
    }
}
