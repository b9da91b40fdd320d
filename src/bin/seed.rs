use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use storefront_cart::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    entity::{
        coupons::{ActiveModel as CouponActive, Column as CouponCol, Entity as Coupons},
        products::{ActiveModel as ProductActive, Column as ProductCol, Entity as Products},
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    },
    middleware::auth::issue_token,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let user_id = ensure_user(&orm, "shopper@example.com").await?;
    seed_products(&orm).await?;
    let code = ensure_coupon(&orm, user_id).await?;

    let token = issue_token(user_id, "customer", &config.jwt_secret, Duration::days(7))?;

    println!("Seed completed. User ID: {user_id}, coupon: {code}");
    println!("CART_API_TOKEN={token}");
    Ok(())
}

async fn ensure_user(orm: &DatabaseConnection, email: &str) -> anyhow::Result<Uuid> {
    if let Some(user) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        return Ok(user.id);
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        role: Set("customer".into()),
        created_at: NotSet,
    }
    .insert(orm)
    .await?;

    println!("Ensured user {email}");
    Ok(user.id)
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let products = vec![
        ("Axum Hoodie", "Warm hoodie for Rustaceans", 5500, "/img/hoodie.png"),
        ("Ferris Mug", "Coffee tastes better with Ferris", 1200, "/img/mug.png"),
        ("Rust Sticker Pack", "Decorate your laptop", 500, "/img/stickers.png"),
        ("E-book: Async Rust", "Learn async Rust patterns", 2500, "/img/ebook.png"),
    ];

    for (name, desc, price, image) in products {
        let exists = Products::find()
            .filter(ProductCol::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(desc.to_string())),
            price: Set(price),
            image: Set(Some(image.to_string())),
            created_at: NotSet,
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn ensure_coupon(orm: &DatabaseConnection, user_id: Uuid) -> anyhow::Result<String> {
    if let Some(coupon) = Coupons::find()
        .filter(CouponCol::UserId.eq(user_id))
        .one(orm)
        .await?
    {
        return Ok(coupon.code);
    }

    let code = format!("GIFT{}", &Uuid::new_v4().simple().to_string()[..6]).to_uppercase();
    CouponActive {
        id: Set(Uuid::new_v4()),
        code: Set(code.clone()),
        discount_percentage: Set(10),
        expires_at: Set((Utc::now() + Duration::days(30)).fixed_offset()),
        is_active: Set(true),
        user_id: Set(user_id),
        created_at: NotSet,
    }
    .insert(orm)
    .await?;

    Ok(code)
}
