//! Catalog browsing and search.

use tokio::io::{AsyncBufReadExt, BufReader};

use qkart_client::{FileStore, Storefront};

use crate::{CliError, output};

/// Print the whole catalog.
pub async fn list(storefront: &Storefront<FileStore>) -> Result<(), CliError> {
    let products = storefront.products().await?;
    output::products(&products);
    Ok(())
}

/// Run one search immediately.
pub async fn search(storefront: &Storefront<FileStore>, query: &str) -> Result<(), CliError> {
    let products = storefront.search(query).await?;
    output::products(&products);
    Ok(())
}

/// Treat each stdin line as the current contents of the search box.
///
/// Lines arriving faster than the debounce delay collapse into one search.
/// At end of input the last pending search is allowed to finish.
pub async fn live_search(storefront: &Storefront<FileStore>) -> Result<(), CliError> {
    let mut debouncer = storefront.debouncer();
    let mut updates = debouncer.subscribe();

    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let update = updates.borrow_and_update().clone();
            output::search_update(&update);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        debouncer.input(line.trim());
    }

    while debouncer.is_pending() {
        tokio::time::sleep(debouncer.delay()).await;
    }

    // Closing the channel stops the printer
    drop(debouncer);
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "Search printer stopped unexpectedly");
    }
    Ok(())
}
