//! Terminal rendering. Results go to stdout, notifications to stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use qkart_client::{SearchOutcome, SearchUpdate};
use qkart_core::{Address, CartView, Product};

pub fn line(text: &str) {
    println!("{text}");
}

pub fn success(message: &str) {
    eprintln!("✓ {message}");
}

pub fn failure(message: &str) {
    eprintln!("✗ {message}");
}

pub fn products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found");
        return;
    }
    for product in products {
        println!(
            "{:<18} {:<40} {:<12} {:>6}  {:.1}★",
            product.id, product.name, product.category, product.cost, product.rating
        );
    }
}

pub fn search_update(update: &SearchUpdate) {
    match &update.outcome {
        SearchOutcome::Idle => {}
        SearchOutcome::Results(found) => {
            println!("-- {:?}: {} result(s)", update.query, found.len());
            products(found);
        }
        SearchOutcome::Failed(err) => {
            failure(&format!("Search for {:?} failed: {err}", update.query));
        }
    }
}

pub fn cart(cart: &CartView) {
    if cart.is_empty() {
        println!("Cart is empty. Add an item to the cart and it will show up here");
        return;
    }
    for item in &cart.items {
        println!(
            "{:<18} {:<40} {:>3} x {:>6} = {:>7}",
            item.product_id,
            item.name,
            item.qty,
            item.cost,
            item.line_total()
        );
    }
    println!("Items: {}  Order total: {}", cart.item_count, cart.total);
}

pub fn addresses(addresses: &[Address]) {
    if addresses.is_empty() {
        println!("No addresses found for this account. Please add one to proceed");
        return;
    }
    for address in addresses {
        println!("{:<26} {}", address.id, address.address);
    }
}
