pub mod cart;
pub mod category;
pub mod order;
pub mod order_line;
pub mod product;
pub mod settings;
pub mod user;
pub mod wishlist;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Schema,
    Set,
};
use tracing::info;

use crate::entities::user::Role;

pub async fn setup_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    // users first, the per-user tables reference it
    create_table(db, user::Entity).await?;
    create_table(db, product::Entity).await?;
    create_table(db, category::Entity).await?;
    create_table(db, settings::Entity).await?;
    create_table(db, cart::Entity).await?;
    create_table(db, wishlist::Entity).await?;
    create_table(db, order::Entity).await?;
    create_table(db, order_line::Entity).await?;
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let table_name = entity.table_name().to_owned();
    let statement = schema
        .create_table_from_entity(entity)
        .if_not_exists()
        .to_owned();
    db.execute(backend.build(&statement)).await?;
    info!(table = %table_name, "Table ready");
    Ok(())
}

/// Creates the `admin` account when it does not exist yet.
pub async fn seed_admin(db: &DatabaseConnection, password: &str) -> Result<(), DbErr> {
    let existing = user::Entity::find()
        .filter(user::Column::Username.eq("admin"))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| DbErr::Custom(format!("Failed to hash admin password: {err}")))?
        .to_string();

    let admin = user::ActiveModel {
        username: Set("admin".to_owned()),
        password: Set(password_hash),
        role: Set(Role::Admin),
        ..Default::default()
    };
    user::Entity::insert(admin).exec(db).await?;
    info!("Seeded admin account");
    Ok(())
}
