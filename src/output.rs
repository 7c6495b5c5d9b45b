use crate::error::{AppError, SearchError};
use crate::model::SearchResult;
use crate::state::ViewState;
use crate::view::{ProductCardView, StarRating, MAX_STARS};

pub const NO_RATING: &str = "No rating";
pub const NO_PRODUCTS: &str = "No products found. Try a different keyword.";

pub fn format_state(state: &ViewState) -> String {
    match state {
        ViewState::Idle => String::new(),
        ViewState::Loading => "Searching...\n".to_string(),
        ViewState::Results { result, views } => format_results(result, views),
        ViewState::Error { error } => format_error(error),
    }
}

pub fn format_state_json(state: &ViewState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(state)
}

pub fn render(state: &ViewState, json: bool) -> Result<String, AppError> {
    if json {
        Ok(format!("{}\n", format_state_json(state)?))
    } else {
        Ok(format_state(state))
    }
}

fn format_results(result: &SearchResult, views: &[ProductCardView]) -> String {
    let mut out = String::new();

    match result.keyword {
        Some(ref keyword) => out.push_str(&format!(
            "## {} products found for \"{}\"\n",
            result.total(),
            keyword
        )),
        None => out.push_str(&format!("## {} products found\n", result.total())),
    }
    out.push_str(&format!("Time: {}s\n", result.execution_time_secs));
    if let Some(ref url) = result.search_url {
        out.push_str(&format!("Source: {}\n", url));
    }
    out.push('\n');

    if views.is_empty() {
        out.push_str(NO_PRODUCTS);
        out.push('\n');
        return out;
    }

    for (i, view) in views.iter().enumerate() {
        out.push_str(&format!("### {}. {}\n", i + 1, view.title));

        let rating = match (view.rating, view.rating_label.as_deref()) {
            (Some(stars), Some(label)) => format!("{} ({})", format_stars(stars), label),
            (Some(stars), None) => format_stars(stars),
            _ => NO_RATING.to_string(),
        };
        out.push_str(&format!("- **Rating:** {}\n", rating));
        out.push_str(&format!("- **Reviews:** {}\n", view.reviews_label));
        out.push_str(&format!("- **Price:** {}\n", view.price_label));
        out.push_str(&format!("- **Image:** {}\n", view.image_url));

        if i < views.len() - 1 {
            out.push_str("\n---\n\n");
        }
    }

    out
}

fn format_error(error: &SearchError) -> String {
    format!(
        "Error: {}\n\nRun the same search again to retry (`:retry` in the shell).\n",
        error
    )
}

/// Never draws more than `MAX_STARS` full stars, whatever the rating says.
pub fn format_stars(stars: StarRating) -> String {
    let full = stars.full.min(MAX_STARS as u32);
    let mut out = "★".repeat(full as usize);
    if stars.half {
        out.push('⯨');
    }
    out.push_str(&"☆".repeat(stars.empty as usize));
    out
}
