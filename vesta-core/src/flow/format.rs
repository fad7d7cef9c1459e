//! Reply text assembly for the guided flow.
//!
//! Everything here produces the mini-markup the parser understands: media
//! lines, bold titles, choice sets and plain deep links.

use crate::models::{ListingFilters, ListingStatus, ListingSummary};

/// Literal lead of the zero-result reply. Tests and the widget host match on
/// this prefix.
pub const NO_RESULTS_REPLY: &str =
    "No properties were found for that filter. Try a different city, budget or status.";

/// Generic apology used whenever a lookup fails outright.
pub const LOOKUP_FAILED_REPLY: &str =
    "Sorry, I couldn't search the listings just now. Please try again in a moment.";

/// Quick actions re-offered under every refinement reply.
pub const DEFAULT_ACTIONS: &[&str] = &[
    "Budget = 5000000",
    "Bedrooms 2+",
    "Open Properties Page",
    "Main Menu",
];

/// Format up to `max_results` listings plus a trailing deep link to the
/// filtered properties page.
pub fn format_listing_reply(
    listings: &[ListingSummary],
    filters: &ListingFilters,
    site_base_url: &str,
    max_results: usize,
) -> String {
    let mut blocks = Vec::new();

    for (index, listing) in listings.iter().take(max_results).enumerate() {
        let mut lines = Vec::new();
        if let Some(image) = listing.first_image() {
            lines.push(format!("![{}]({})", listing.title, image));
        }
        lines.push(format!("**{}. {}**", index + 1, listing.title));
        lines.push(format_price(listing.price, &listing.country));

        let location = compose_location(listing);
        if !location.is_empty() {
            lines.push(location);
        }
        let details = details_line(listing);
        if !details.is_empty() {
            lines.push(details);
        }
        lines.push(format!("View: {}", listing_link(listing, site_base_url)));

        blocks.push(lines.join("\n"));
    }

    let mut reply = blocks.join("\n\n");
    reply.push_str(&format!(
        "\n\nBrowse all matching properties: {}",
        properties_page_link(filters.status, site_base_url)
    ));
    reply
}

/// Append the default quick-action choice set to a reply body.
pub fn with_default_actions(body: &str) -> String {
    format!("{}\n\n[CHOICES]{}[/CHOICES]", body, DEFAULT_ACTIONS.join("|"))
}

/// Locale-formatted price, zero decimal places, currency symbol inferred
/// from the listing's country.
pub fn format_price(price: f64, country: &str) -> String {
    let amount = if price.is_finite() && price > 0.0 {
        price.round() as u64
    } else {
        0
    };
    format!("{}{}", currency_symbol(country), group_thousands(amount))
}

fn currency_symbol(country: &str) -> &'static str {
    match country.trim().to_lowercase().as_str() {
        "united states" | "usa" | "us" => "$",
        "canada" => "C$",
        "australia" => "A$",
        "singapore" => "S$",
        "japan" => "\u{a5}",
        "united kingdom" | "uk" => "\u{a3}",
        "france" | "germany" | "spain" | "italy" => "\u{20ac}",
        // The home market; also the fallback for blank or unknown countries.
        _ => "\u{20b1}",
    }
}

fn group_thousands(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut groups = Vec::new();
    while value > 0 {
        groups.push(value % 1_000);
        value /= 1_000;
    }
    groups.reverse();
    let mut out = groups[0].to_string();
    for group in &groups[1..] {
        out.push_str(&format!(",{:03}", group));
    }
    out
}

/// Address, city, state and country joined with blanks filtered out.
fn compose_location(listing: &ListingSummary) -> String {
    [
        listing.address.as_str(),
        listing.city.as_str(),
        listing.state.as_str(),
        listing.country.as_str(),
    ]
    .iter()
    .map(|part| part.trim())
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(", ")
}

/// Type, status, bedrooms and bathrooms joined with blanks filtered out.
fn details_line(listing: &ListingSummary) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(kind) = listing.property_type.as_deref() {
        if !kind.trim().is_empty() {
            parts.push(kind.trim().to_string());
        }
    }
    if let Some(status) = listing.status.as_deref() {
        if !status.trim().is_empty() {
            parts.push(status.trim().to_string());
        }
    }
    if let Some(bedrooms) = listing.bedrooms {
        parts.push(format!("{} BR", bedrooms));
    }
    if let Some(bathrooms) = listing.bathrooms {
        parts.push(format!("{} BA", bathrooms));
    }
    parts.join(" | ")
}

fn listing_link(listing: &ListingSummary, site_base_url: &str) -> String {
    match listing.link_segment() {
        Some(segment) => format!("{}/properties/{}", site_base_url, segment),
        None => format!("{}/properties", site_base_url),
    }
}

/// Deep link to the properties page, filtered by status when one is set.
pub fn properties_page_link(status: Option<ListingStatus>, site_base_url: &str) -> String {
    match status {
        Some(status) => format!("{}/properties?status={}", site_base_url, status.slug()),
        None => format!("{}/properties", site_base_url),
    }
}
