//! Product search and product view commands.

use tracing::debug;

use quickcart_storefront::error::Result;
use quickcart_storefront::state::AppState;

/// Search and print one page of results.
///
/// # Errors
///
/// Returns an error if the query is blank or the search webhook fails.
#[allow(clippy::print_stdout)]
pub async fn search(state: &AppState, query: &str, page: usize) -> Result<()> {
    let results = state.search(query).await?;

    for warning in &results.warnings {
        println!("warning: {warning}");
    }

    let page = results.page(page, state.search_service().page_size());
    if page.products.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    for product in page.products {
        let rating = product
            .rating
            .map_or_else(String::new, |r| format!("  {r:.1}/5"));
        println!(
            "{:<12} {:<40} {:>10}  {}{}",
            product.id.as_str(),
            product.title,
            product.price.to_string(),
            product.availability_status,
            rating
        );
    }
    println!("Page {} of {}", page.number, page.total_pages);
    Ok(())
}

/// Record a product view.
///
/// The notification's outcome is not reported; the command waits only so
/// the request is not cut off when the process exits.
#[allow(clippy::print_stdout)]
pub async fn view(state: &AppState, title: &str) {
    if let Err(e) = state.search_service().record_product_view(title).await {
        debug!(error = %e, "Product view task failed");
    }
    println!("Saved.");
}
