//! Guided inquiry state machine.
//!
//! Quick-action buttons and free-text city replies drive a structured
//! search over the listings backend. Each transition queries with the
//! accumulated filters and appends formatted assistant replies. A failed or
//! empty query never advances the flow and never surfaces an error: the
//! caller always gets a same-shape assistant message back.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, warn};

use crate::adapters::ListingsLookup;
use crate::config::FlowConfig;
use crate::models::{ListingFilters, ListingStatus, Message};

use super::format::{
    format_listing_reply, properties_page_link, with_default_actions, LOOKUP_FAILED_REPLY,
    NO_RESULTS_REPLY,
};
use super::state::{FlowPhase, GuidedFlowState};

pub const ACTION_INQUIRE: &str = "Inquire A Property";
pub const ACTION_OPEN_PROPERTIES: &str = "Open Properties Page";
pub const ACTION_MAIN_MENU: &str = "Main Menu";
pub const STATUS_ALL: &str = "All";

const STATUS_PROMPT: &str = "Sure! What kind of listing are you looking for?\n\n[CHOICES]For Sale|For Rent|Preselling|RFO|All[/CHOICES]";
const MAIN_MENU_REPLY: &str = "Okay, back to the main menu. What would you like to do next?\n\n[CHOICES]Inquire A Property|Open Properties Page[/CHOICES]";
const CITY_HINT: &str = "Type a city name to narrow these down, or tap a quick filter.";

static BUDGET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Budget\s*=\s*(\d[\d,_]*)$").expect("budget pattern"));
static BEDROOMS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Bedrooms\s+(\d+)\+$").expect("bedrooms pattern"));

pub struct GuidedFlow {
    state: GuidedFlowState,
    lookup: Arc<dyn ListingsLookup>,
    config: FlowConfig,
}

impl GuidedFlow {
    pub fn new(lookup: Arc<dyn ListingsLookup>, config: FlowConfig) -> Self {
        Self {
            state: GuidedFlowState::new(),
            lookup,
            config,
        }
    }

    pub fn state(&self) -> &GuidedFlowState {
        &self.state
    }

    pub fn phase(&self) -> FlowPhase {
        self.state.phase
    }

    pub fn filters(&self) -> &ListingFilters {
        &self.state.filters
    }

    /// The guided dialogue is over; only Main Menu revives it.
    pub fn close(&mut self) {
        self.state.phase = FlowPhase::Closed;
    }

    /// Consume one quick-action tap. Returns the assistant replies to
    /// append, or an empty list when the action is not a flow action.
    pub async fn handle_quick_action(&mut self, action: &str) -> Vec<Message> {
        let action = action.trim();

        if action == ACTION_MAIN_MENU {
            self.state.reset();
            return vec![Message::assistant(MAIN_MENU_REPLY)];
        }

        if action == ACTION_INQUIRE {
            self.state.phase = FlowPhase::AwaitingFilterChoice;
            return vec![Message::assistant(STATUS_PROMPT)];
        }

        if action == ACTION_OPEN_PROPERTIES {
            let status = self.state.filters.status.unwrap_or(ListingStatus::ForSale);
            let link = properties_page_link(Some(status), &self.config.site_base_url);
            return vec![Message::assistant(format!(
                "You can browse all {} properties here: {}",
                status.label(),
                link
            ))];
        }

        if self.state.phase == FlowPhase::AwaitingFilterChoice
            && (action == STATUS_ALL || ListingStatus::from_label(action).is_some())
        {
            let mut filters = self.state.filters.clone();
            // "All" clears the status filter instead of setting one.
            filters.status = ListingStatus::from_label(action);
            let reply = self
                .query_and_commit(filters, FlowPhase::AwaitingCityText, Some(CITY_HINT))
                .await;
            return vec![reply];
        }

        if self.state.accepts_city_text() {
            if let Some(caps) = BUDGET_RE.captures(action) {
                let digits: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
                if let Ok(value) = digits.parse::<u64>() {
                    let mut filters = self.state.filters.clone();
                    filters.max_price = Some(value);
                    let reply = self.query_and_commit(filters, self.state.phase, None).await;
                    return vec![reply];
                }
            }

            if let Some(caps) = BEDROOMS_RE.captures(action) {
                if let Ok(value) = caps[1].parse::<u32>() {
                    let mut filters = self.state.filters.clone();
                    filters.min_bedrooms = Some(value);
                    let reply = self.query_and_commit(filters, self.state.phase, None).await;
                    return vec![reply];
                }
            }
        }

        debug!(action, "quick action not handled by guided flow");
        Vec::new()
    }

    /// Consume a free-text user message as a city refinement. Returns
    /// `None` when the flow is not expecting a city, so the caller can fall
    /// through to free-form chat.
    pub async fn handle_free_text(&mut self, text: &str) -> Option<Vec<Message>> {
        let text = text.trim();
        if text.is_empty() || !self.state.accepts_city_text() {
            return None;
        }

        let mut filters = self.state.filters.clone();
        filters.city = Some(text.to_string());
        let reply = self.query_and_commit(filters, FlowPhase::Refined, None).await;
        Some(vec![reply])
    }

    /// Query with candidate filters; commit filters and phase only when the
    /// query yields results. Zero results and failures leave the state
    /// exactly as it was.
    async fn query_and_commit(
        &mut self,
        filters: ListingFilters,
        next_phase: FlowPhase,
        hint: Option<&str>,
    ) -> Message {
        match self.lookup.search(&filters).await {
            Ok(listings) if listings.is_empty() => {
                debug!(?filters, "zero results, keeping previous filters");
                Message::assistant(with_default_actions(NO_RESULTS_REPLY))
            }
            Ok(listings) => {
                let mut body = format_listing_reply(
                    &listings,
                    &filters,
                    &self.config.site_base_url,
                    self.config.max_results,
                );
                if let Some(hint) = hint {
                    body.push_str("\n\n");
                    body.push_str(hint);
                }
                self.state.filters = filters;
                self.state.phase = next_phase;
                Message::assistant(with_default_actions(&body))
            }
            Err(err) => {
                warn!(error = %err, "listings lookup failed during flow transition");
                Message::assistant(with_default_actions(LOOKUP_FAILED_REPLY))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{VestaError, VestaResult};
    use crate::models::ListingSummary;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubLookup {
        results: Vec<ListingSummary>,
        fail: bool,
        recorded: Mutex<Vec<ListingFilters>>,
    }

    impl StubLookup {
        fn with_results(count: usize) -> Self {
            let results = (0..count)
                .map(|i| ListingSummary {
                    title: format!("Listing {}", i),
                    price: 1_000_000.0,
                    country: "Philippines".to_string(),
                    slug: Some(format!("listing-{}", i)),
                    ..Default::default()
                })
                .collect();
            Self {
                results,
                fail: false,
                recorded: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                results: Vec::new(),
                fail: true,
                recorded: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ListingsLookup for StubLookup {
        async fn search(&self, filters: &ListingFilters) -> VestaResult<Vec<ListingSummary>> {
            self.recorded.lock().unwrap().push(filters.clone());
            if self.fail {
                return Err(VestaError::ServiceUnavailable("down".to_string()));
            }
            Ok(self.results.clone())
        }
    }

    fn flow(lookup: StubLookup) -> GuidedFlow {
        GuidedFlow::new(Arc::new(lookup), FlowConfig::default())
    }

    #[tokio::test]
    async fn test_inquire_prompts_for_status() {
        let mut flow = flow(StubLookup::with_results(1));
        let replies = flow.handle_quick_action(ACTION_INQUIRE).await;

        assert_eq!(replies.len(), 1);
        assert!(replies[0].text().contains("[CHOICES]For Sale|For Rent|Preselling|RFO|All[/CHOICES]"));
        assert_eq!(flow.phase(), FlowPhase::AwaitingFilterChoice);
        assert!(flow.filters().is_empty());
    }

    #[tokio::test]
    async fn test_all_choice_clears_status_filter() {
        let mut flow = flow(StubLookup::with_results(1));
        flow.handle_quick_action(ACTION_INQUIRE).await;
        flow.handle_quick_action(STATUS_ALL).await;

        assert_eq!(flow.phase(), FlowPhase::AwaitingCityText);
        assert_eq!(flow.filters().status, None);
    }

    #[tokio::test]
    async fn test_zero_results_keep_state() {
        let mut flow = flow(StubLookup::with_results(0));
        flow.handle_quick_action(ACTION_INQUIRE).await;
        let replies = flow.handle_quick_action("Preselling").await;

        assert!(replies[0].text().starts_with(NO_RESULTS_REPLY));
        assert_eq!(flow.phase(), FlowPhase::AwaitingFilterChoice);
        assert!(flow.filters().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_keeps_state_and_actions() {
        let mut flow = flow(StubLookup::failing());
        flow.handle_quick_action(ACTION_INQUIRE).await;
        let replies = flow.handle_quick_action("For Sale").await;

        assert!(replies[0].text().starts_with(LOOKUP_FAILED_REPLY));
        assert!(replies[0].text().contains("[CHOICES]"));
        assert_eq!(flow.phase(), FlowPhase::AwaitingFilterChoice);
        assert!(flow.filters().is_empty());
    }

    #[tokio::test]
    async fn test_main_menu_resets_from_any_phase() {
        let mut flow = flow(StubLookup::with_results(2));
        flow.handle_quick_action(ACTION_INQUIRE).await;
        flow.handle_quick_action("For Rent").await;
        flow.handle_free_text("Cebu").await;
        assert_eq!(flow.phase(), FlowPhase::Refined);

        let replies = flow.handle_quick_action(ACTION_MAIN_MENU).await;
        assert!(replies[0].text().contains("Inquire A Property"));
        assert_eq!(flow.phase(), FlowPhase::Idle);
        assert!(flow.filters().is_empty());
    }

    #[tokio::test]
    async fn test_open_properties_uses_default_status_when_unset() {
        let mut flow = flow(StubLookup::with_results(1));
        let replies = flow.handle_quick_action(ACTION_OPEN_PROPERTIES).await;

        assert!(replies[0]
            .text()
            .contains("/properties?status=for-sale"));
        assert_eq!(flow.phase(), FlowPhase::Idle);
    }

    #[tokio::test]
    async fn test_budget_action_merges_all_filters_into_query() {
        let lookup = StubLookup::with_results(1);
        let mut flow = GuidedFlow::new(Arc::new(lookup), FlowConfig::default());
        flow.handle_quick_action(ACTION_INQUIRE).await;
        flow.handle_quick_action("For Rent").await;
        flow.handle_free_text("Cebu").await;
        flow.handle_quick_action("Budget = 5,000,000").await;

        assert_eq!(flow.phase(), FlowPhase::Refined);
        assert_eq!(flow.filters().status, Some(ListingStatus::ForRent));
        assert_eq!(flow.filters().city.as_deref(), Some("Cebu"));
        assert_eq!(flow.filters().max_price, Some(5_000_000));
    }

    #[tokio::test]
    async fn test_bedrooms_action_sets_minimum() {
        let mut flow = flow(StubLookup::with_results(1));
        flow.handle_quick_action(ACTION_INQUIRE).await;
        flow.handle_quick_action("RFO").await;
        flow.handle_quick_action("Bedrooms 3+").await;

        assert_eq!(flow.filters().min_bedrooms, Some(3));
        assert_eq!(flow.phase(), FlowPhase::AwaitingCityText);
    }

    #[tokio::test]
    async fn test_free_text_ignored_outside_refinement_phases() {
        let mut flow = flow(StubLookup::with_results(1));
        assert!(flow.handle_free_text("Cebu").await.is_none());

        flow.close();
        assert!(flow.handle_free_text("Cebu").await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_action_is_not_consumed() {
        let mut flow = flow(StubLookup::with_results(1));
        let replies = flow.handle_quick_action("Schedule A Viewing").await;
        assert!(replies.is_empty());
    }
}
