use serde::{Deserialize, Serialize};

use crate::models::ListingFilters;

/// Where the guided inquiry dialogue currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    Idle,
    AwaitingFilterChoice,
    AwaitingCityText,
    Refined,
    Closed,
}

/// The guided flow's whole mutable state: phase plus accumulated filters.
/// Filters only grow during a traversal; Main Menu is the single reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidedFlowState {
    pub phase: FlowPhase,
    pub filters: ListingFilters,
}

impl GuidedFlowState {
    pub fn new() -> Self {
        Self {
            phase: FlowPhase::Idle,
            filters: ListingFilters::default(),
        }
    }

    /// Back to the main menu: phase idle, filters cleared.
    pub fn reset(&mut self) {
        self.phase = FlowPhase::Idle;
        self.filters = ListingFilters::default();
    }

    /// Whether free text is currently interpreted as a city refinement.
    pub fn accepts_city_text(&self) -> bool {
        matches!(self.phase, FlowPhase::AwaitingCityText | FlowPhase::Refined)
    }
}

impl Default for GuidedFlowState {
    fn default() -> Self {
        Self::new()
    }
}
