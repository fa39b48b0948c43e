//! Checkout command.

use quickcart_storefront::error::Result;
use quickcart_storefront::state::AppState;

/// Submit the cart and print the receipt.
///
/// # Errors
///
/// Returns an error if no one is signed in, the cart is empty, or the order
/// webhook fails.
#[allow(clippy::print_stdout)]
pub async fn checkout(state: &AppState) -> Result<()> {
    let receipt = state.checkout().await?;
    println!("Order placed: {}", receipt.summary);
    println!("Total: {} ({} items)", receipt.total, receipt.item_count);
    Ok(())
}
