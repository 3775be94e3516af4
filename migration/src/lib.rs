pub use sea_orm_migration::prelude::*;

mod m20260901_000001_create_users_and_points;
mod m20260901_000002_create_group_buy;
mod m20260901_000003_create_lotteries;
mod m20260915_000001_add_checkins;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_000001_create_users_and_points::Migration),
            Box::new(m20260901_000002_create_group_buy::Migration),
            Box::new(m20260901_000003_create_lotteries::Migration),
            Box::new(m20260915_000001_add_checkins::Migration),
        ]
    }
}
