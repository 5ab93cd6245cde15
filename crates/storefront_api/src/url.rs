use std::sync::OnceLock;

use regex::Regex;

use crate::error::ApiError;

/// Extracts `(shop_id, item_id)` from a product URL.
///
/// Two URL shapes are accepted: the canonical `/product/{shop}/{item}` path
/// and the slug form ending in `-i.{shop}.{item}`.
pub fn parse_item_url(url: &str) -> Result<(i64, i64), ApiError> {
    static PRODUCT: OnceLock<Regex> = OnceLock::new();
    static SLUG: OnceLock<Regex> = OnceLock::new();

    let product = PRODUCT
        .get_or_init(|| Regex::new(r"/product/(\d+)/(\d+)").expect("product url pattern"));
    let slug = SLUG.get_or_init(|| Regex::new(r"-i\.(\d+)\.(\d+)").expect("slug url pattern"));

    let captures = product
        .captures(url)
        .or_else(|| slug.captures(url))
        .ok_or_else(|| ApiError::InvalidItemUrl(url.to_string()))?;

    let shop_id = captures[1]
        .parse::<i64>()
        .map_err(|_| ApiError::InvalidItemUrl(url.to_string()))?;
    let item_id = captures[2]
        .parse::<i64>()
        .map_err(|_| ApiError::InvalidItemUrl(url.to_string()))?;
    Ok((shop_id, item_id))
}

#[cfg(test)]
mod tests {
    use super::parse_item_url;
    use crate::error::ApiError;

    #[test]
    fn parses_product_path_form() {
        let (shop, item) =
            parse_item_url("https://mall.example.com/product/8382968/1232936102").expect("parse");
        assert_eq!((shop, item), (8_382_968, 1_232_936_102));
    }

    #[test]
    fn parses_slug_form() {
        let (shop, item) =
            parse_item_url("https://mall.example.com/Kaos-Polos-Katun-i.8382968.1232936102")
                .expect("parse");
        assert_eq!((shop, item), (8_382_968, 1_232_936_102));
    }

    #[test]
    fn rejects_unrecognized_urls() {
        let result = parse_item_url("https://mall.example.com/search?q=kaos");
        assert!(matches!(result, Err(ApiError::InvalidItemUrl(_))));
    }
}
