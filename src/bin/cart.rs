use clap::{Parser, Subcommand};
use storefront_cart::{
    client::{CartStore, FileSnapshotStore, HttpCartApi, TracingNotifier},
    config::ClientConfig,
    models::Product,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Drive the cart view-model against a running storefront server.
#[derive(Debug, Parser)]
#[command(name = "cart", version)]
struct Cli {
    #[command(subcommand)]
    command: CartCommand,
}

#[derive(Debug, Subcommand)]
enum CartCommand {
    /// Print the locally cached cart without contacting the server.
    Show,
    /// Refresh the cart from the server.
    Sync,
    /// Add one unit of a product.
    Add {
        product_id: Uuid,
        #[arg(long)]
        name: String,
        /// Price in minor units.
        #[arg(long)]
        price: i64,
    },
    /// Remove a product's line.
    Remove { product_id: Uuid },
    /// Set a product's quantity; 0 removes the line.
    Set { product_id: Uuid, quantity: u32 },
    /// Empty the cart and forget the coupon.
    Clear,
    /// Fetch the coupon assigned to the current user.
    Coupon,
    /// Validate and apply a coupon code.
    Apply { code: String },
    /// Stop applying the current coupon.
    DropCoupon,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();

    let api = HttpCartApi::new(config.api_url, config.token);
    let storage = FileSnapshotStore::new(config.storage_dir);
    let mut store = CartStore::load(api, storage, TracingNotifier);

    match cli.command {
        CartCommand::Show => {}
        CartCommand::Sync => store.get_cart_items().await?,
        CartCommand::Add {
            product_id,
            name,
            price,
        } => {
            let product = Product {
                id: product_id,
                name,
                description: None,
                price,
                image: None,
            };
            store.add_to_cart(&product).await?
        }
        CartCommand::Remove { product_id } => store.remove_from_cart(product_id).await?,
        CartCommand::Set {
            product_id,
            quantity,
        } => store.update_quantity(product_id, quantity).await?,
        CartCommand::Clear => store.clear_cart().await?,
        CartCommand::Coupon => store.fetch_coupon().await?,
        CartCommand::Apply { code } => store.apply_coupon(&code).await?,
        CartCommand::DropCoupon => store.remove_coupon(),
    }

    for line in store.cart() {
        println!(
            "{}  {:<24} {:>4} x {:>8}",
            line.product.id, line.product.name, line.quantity, line.product.price
        );
    }
    if let Some(coupon) = store.coupon() {
        let status = if store.is_coupon_applied() {
            "applied"
        } else {
            "available"
        };
        println!("coupon {} (-{}%) {status}", coupon.code, coupon.discount_percentage);
    }
    println!("subtotal: {}", store.subtotal());
    println!("total:    {}", store.total());

    Ok(())
}
