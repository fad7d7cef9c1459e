use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::error::{VestaError, VestaResult};
use crate::models::{ListingFilters, ListingSummary};

use super::traits::ListingsLookup;

/// HTTP consumer of the listings search endpoint.
pub struct HttpListingsLookup {
    client: Client,
    base_url: String,
}

impl HttpListingsLookup {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: config.api_base_url.clone(),
        }
    }

    fn query_params(filters: &ListingFilters) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = filters.status {
            params.push(("status", status.slug().to_string()));
        }
        if let Some(city) = &filters.city {
            params.push(("city", city.clone()));
        }
        if let Some(max_price) = filters.max_price {
            params.push(("maxPrice", max_price.to_string()));
        }
        if let Some(min_bedrooms) = filters.min_bedrooms {
            params.push(("bedrooms", min_bedrooms.to_string()));
        }
        if let Some(featured) = filters.featured {
            params.push(("featured", featured.to_string()));
        }
        params
    }
}

#[async_trait]
impl ListingsLookup for HttpListingsLookup {
    async fn search(&self, filters: &ListingFilters) -> VestaResult<Vec<ListingSummary>> {
        let url = format!("{}/properties", self.base_url);
        debug!(?filters, "querying listings");

        let response = self
            .client
            .get(&url)
            .query(&Self::query_params(filters))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(VestaError::ServiceUnavailable(format!(
                    "listings search returned {status}"
                )));
            }
            return Err(VestaError::ServerRejection {
                status: status.as_u16(),
                message,
            });
        }

        // A payload that does not match the expected shape is not worth
        // failing the whole flow turn over; log and treat as no results.
        match response.json::<Vec<ListingSummary>>().await {
            Ok(listings) => Ok(listings),
            Err(err) => {
                warn!(error = %err, "malformed listings payload, treating as empty");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListingStatus;

    #[test]
    fn test_query_params_skip_unset_filters() {
        let filters = ListingFilters::default();
        assert!(HttpListingsLookup::query_params(&filters).is_empty());
    }

    #[test]
    fn test_query_params_render_all_filters() {
        let filters = ListingFilters {
            status: Some(ListingStatus::ForRent),
            city: Some("Cebu".to_string()),
            max_price: Some(5_000_000),
            min_bedrooms: Some(2),
            featured: Some(true),
        };
        let params = HttpListingsLookup::query_params(&filters);
        assert_eq!(
            params,
            vec![
                ("status", "for-rent".to_string()),
                ("city", "Cebu".to_string()),
                ("maxPrice", "5000000".to_string()),
                ("bedrooms", "2".to_string()),
                ("featured", "true".to_string()),
            ]
        );
    }
}
