use serde::{Deserialize, Serialize};

/// Market status of a listing. `All` on a quick action clears the filter
/// rather than setting one, so it is not represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListingStatus {
    ForSale,
    ForRent,
    Preselling,
    Rfo,
}

impl ListingStatus {
    /// Parse the human label used on quick-action buttons.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "For Sale" => Some(ListingStatus::ForSale),
            "For Rent" => Some(ListingStatus::ForRent),
            "Preselling" => Some(ListingStatus::Preselling),
            "RFO" => Some(ListingStatus::Rfo),
            _ => None,
        }
    }

    /// The label shown on buttons and in listing detail lines.
    pub fn label(&self) -> &'static str {
        match self {
            ListingStatus::ForSale => "For Sale",
            ListingStatus::ForRent => "For Rent",
            ListingStatus::Preselling => "Preselling",
            ListingStatus::Rfo => "RFO",
        }
    }

    /// URL slug used in deep links and query params.
    pub fn slug(&self) -> &'static str {
        match self {
            ListingStatus::ForSale => "for-sale",
            ListingStatus::ForRent => "for-rent",
            ListingStatus::Preselling => "preselling",
            ListingStatus::Rfo => "rfo",
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Accumulated search filters for one guided-flow traversal.
///
/// Filters only grow while the flow advances; they are cleared as a whole
/// when the visitor returns to the main menu.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilters {
    pub status: Option<ListingStatus>,
    pub city: Option<String>,
    pub max_price: Option<u64>,
    pub min_bedrooms: Option<u32>,
    pub featured: Option<bool>,
}

impl ListingFilters {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.city.is_none()
            && self.max_price.is_none()
            && self.min_bedrooms.is_none()
            && self.featured.is_none()
    }
}

/// One row of a Listings Lookup response. The backend owns this shape; the
/// engine only reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingSummary {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(rename = "type", default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

impl ListingSummary {
    /// Path segment for this listing's detail page: slug when present,
    /// otherwise the raw id.
    pub fn link_segment(&self) -> Option<&str> {
        self.slug
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.id.as_deref())
    }

    pub fn first_image(&self) -> Option<&str> {
        self.images.iter().map(String::as_str).find(|u| !u.is_empty())
    }
}
