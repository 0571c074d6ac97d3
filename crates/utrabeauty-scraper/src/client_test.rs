use super::*;

#[test]
fn validate_listing_url_accepts_https() {
    let url = validate_listing_url("  https://www.amazon.com/dp/B0TEST123 ").unwrap();
    assert_eq!(url.as_str(), "https://www.amazon.com/dp/B0TEST123");
}

#[test]
fn validate_listing_url_rejects_relative() {
    let err = validate_listing_url("/item/1005001.html").unwrap_err();
    assert!(
        matches!(err, ScraperError::InvalidUrl { .. }),
        "expected InvalidUrl, got: {err:?}"
    );
}

#[test]
fn validate_listing_url_rejects_other_schemes() {
    let err = validate_listing_url("ftp://files.example.com/listing").unwrap_err();
    assert!(err.to_string().contains("unsupported scheme"));
}

#[test]
fn extract_domain_strips_scheme_and_path() {
    assert_eq!(
        origin::extract_domain("https://www.aliexpress.com/item/1005001.html"),
        "www.aliexpress.com"
    );
    assert_eq!(origin::extract_domain("not a url"), "not a url");
}

#[test]
fn bot_challenge_detects_cloudflare() {
    let body = "<html><title>Just a moment...</title><p>Please enable cookies.</p></html>";
    assert!(looks_like_bot_challenge(body));
    assert!(!is_usable_html(body));
}

#[test]
fn bot_challenge_detects_amazon_robot_check() {
    let body = r#"<form action="/errors/validateCaptcha"><p>Enter the characters you see below</p></form>"#;
    assert!(looks_like_bot_challenge(body));
}

#[test]
fn ordinary_product_page_is_usable() {
    let body = "<html><h1>Rose Glow Serum</h1><span class=\"price\">$24.99</span></html>";
    assert!(is_usable_html(body));
}

#[test]
fn blank_page_is_not_usable() {
    assert!(!is_usable_html("   \n  "));
}

#[test]
fn new_scraper_uses_builtin_selectors() {
    let scraper = ListingScraper::new(5, "utrabeauty-test/0.1", 0, 0).unwrap();
    assert_eq!(scraper.user_agent, "utrabeauty-test/0.1");
    assert_eq!(scraper.max_retries, 0);
}
