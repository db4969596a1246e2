//! Catalog seeding for local development.

use rust_decimal::Decimal;

use moostyle_server::db::RepositoryError;
use moostyle_server::db::products::ProductRepository;

use super::{CliError, connect};

/// Sample mods: (handle, title, category, price in cents).
const SAMPLE_MODS: &[(&str, &str, &str, i64)] = &[
    ("pastel-streetwear-pack", "Pastel Streetwear Pack", "tops", 499),
    ("midnight-denim-set", "Midnight Denim Set", "bottoms", 599),
    ("holo-sneaker-bundle", "Holo Sneaker Bundle", "shoes", 799),
    ("cottagecore-dress-trio", "Cottagecore Dress Trio", "dresses", 649),
    ("neon-rave-accessories", "Neon Rave Accessories", "accessories", 349),
    ("vintage-varsity-jackets", "Vintage Varsity Jackets", "outerwear", 899),
    ("sakura-kimono-capsule", "Sakura Kimono Capsule", "outerwear", 749),
    ("chrome-jewelry-kit", "Chrome Jewelry Kit", "accessories", 299),
];

/// Insert the sample catalog; entries that already exist are skipped.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or an insert fails for
/// a reason other than an existing handle.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;
    let products = ProductRepository::new(&pool);

    let mut created = 0u32;
    for &(handle, title, category, cents) in SAMPLE_MODS {
        match products
            .create(handle, title, category, Decimal::new(cents, 2))
            .await
        {
            Ok(product) => {
                tracing::info!(handle = %product.handle, "seeded");
                created += 1;
            }
            Err(RepositoryError::Conflict(_)) => {
                tracing::debug!(handle, "already present, skipped");
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(created, total = SAMPLE_MODS.len(), "seed complete");
    Ok(())
}
