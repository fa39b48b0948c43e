//! Cart commands.

use quickcart_core::{AvailabilityStatus, Price, Product, ProductId};
use quickcart_storefront::error::Result;
use quickcart_storefront::models::CartEvent;
use quickcart_storefront::state::AppState;

/// Print the cart lines and total.
#[allow(clippy::print_stdout)]
pub fn show(state: &AppState) {
    let cart = state.cart().snapshot();
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for line in cart.lines() {
        println!(
            "{:<12} {:<40} {:>3} x {:>10} = {:>10}",
            line.product_id.as_str(),
            line.title,
            line.quantity,
            line.unit_price.to_string(),
            line.line_total().to_string()
        );
    }
    println!("Total: {} ({} items)", cart.total(), cart.item_count());
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns an error if no one is signed in or the cart cannot be saved.
pub fn add(
    state: &AppState,
    id: String,
    title: String,
    price: Price,
    thumbnail: Option<String>,
) -> Result<()> {
    let product = Product {
        id: ProductId::new(id),
        title,
        description: String::new(),
        price,
        rating: None,
        availability_status: AvailabilityStatus::default(),
        thumbnail,
    };
    let event = state.cart().add_item(&product)?;
    print_count(event);
    Ok(())
}

/// Overwrite a line's quantity.
///
/// # Errors
///
/// Returns an error if no one is signed in or the cart cannot be saved.
pub fn set(state: &AppState, id: &str, quantity: i64) -> Result<()> {
    let event = state.cart().set_quantity(&ProductId::new(id), quantity)?;
    print_count(event);
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if no one is signed in or the cart cannot be saved.
pub fn remove(state: &AppState, id: &str) -> Result<()> {
    let event = state.cart().remove_item(&ProductId::new(id))?;
    print_count(event);
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_count(event: CartEvent) {
    println!("Cart: {} items", event.item_count);
}
