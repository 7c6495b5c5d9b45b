use crate::format::{format_count, format_price};
use crate::model::Product;
use serde::Serialize;

pub const TITLE_UNAVAILABLE: &str = "Title unavailable";
pub const PLACEHOLDER_IMAGE: &str = "/placeholder-image.png";
pub const MAX_STARS: i64 = 5;

/// Star breakdown of a rating, e.g. 4.5 -> 4 full, 1 half, 0 empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StarRating {
    pub full: u32,
    pub half: bool,
    pub empty: u32,
}

impl StarRating {
    /// Floor plus half-star threshold. Out-of-range ratings are not
    /// validated; they only lose stars the arithmetic would make negative.
    pub fn from_rating(rating: f64) -> Self {
        let full = rating.floor() as i64;
        let half = rating % 1.0 >= 0.5;
        let empty = MAX_STARS - full - i64::from(half);
        Self {
            full: u32::try_from(full.max(0)).unwrap_or(u32::MAX),
            half,
            empty: empty.clamp(0, MAX_STARS) as u32,
        }
    }
}

/// Display-ready projection of one [`Product`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCardView {
    pub title: String,
    pub rating: Option<StarRating>,
    pub rating_label: Option<String>,
    pub reviews_label: String,
    pub image_url: String,
    pub price_label: String,
}

impl ProductCardView {
    /// Same card with the placeholder image, for images that failed to load.
    pub fn with_placeholder_image(self) -> Self {
        Self {
            image_url: PLACEHOLDER_IMAGE.to_string(),
            ..self
        }
    }

    pub fn has_placeholder_image(&self) -> bool {
        self.image_url == PLACEHOLDER_IMAGE
    }
}

pub fn build_card_view(product: &Product, currency_symbol: &str) -> ProductCardView {
    let rating = product
        .rating
        .as_deref()
        .and_then(|r| r.trim().parse::<f64>().ok())
        .filter(|r| r.is_finite());

    ProductCardView {
        title: product
            .title
            .clone()
            .unwrap_or_else(|| TITLE_UNAVAILABLE.to_string()),
        rating: rating.map(StarRating::from_rating),
        rating_label: rating.map(|r| r.to_string()),
        reviews_label: format!("{} reviews", format_count(&product.reviews_count)),
        image_url: product
            .image_url
            .clone()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        price_label: format_price(product.price.as_deref(), currency_symbol),
    }
}
