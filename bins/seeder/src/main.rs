//! Database seeder for Comptrack development and testing.
//!
//! Seeds a demo company with an admin, a manager, and two reps, an annual
//! target split into quarters, and a handful of deals in various states.
//!
//! Usage: cargo run --bin seeder

use anyhow::{Context, bail};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use comptrack_core::auth::hash_password;
use comptrack_core::commission::CommissionCalculator;
use comptrack_core::period::{Period, PeriodType};
use comptrack_core::target::NewTarget;
use comptrack_db::entities::{
    companies,
    sea_orm_active_enums::{DealStatus, ForecastCategory, UserRole},
};
use comptrack_db::repositories::{
    CreateUserInput, DealRepository, SyncDealInput, TargetRepository, UserRepository,
};

/// Demo company ID (consistent for all seeds)
const DEMO_COMPANY_ID: Uuid = Uuid::from_u128(1);

/// Password shared by every seeded user.
const DEMO_PASSWORD: &str = "comptrack-demo";

struct SeededUsers {
    admin: Uuid,
    manager: Uuid,
    reps: Vec<Uuid>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = comptrack_db::connect(&database_url)
        .await
        .context("failed to connect to database")?;

    if companies::Entity::find_by_id(DEMO_COMPANY_ID)
        .one(&db)
        .await?
        .is_some()
    {
        println!("Demo company already exists, nothing to do.");
        return Ok(());
    }

    println!("Seeding demo company...");
    seed_company(&db).await?;

    println!("Seeding users...");
    let users = seed_users(&db).await?;

    let year = Utc::now().date_naive().year();

    println!("Seeding targets for {year}...");
    seed_targets(&db, &users, year).await?;

    println!("Seeding deals...");
    seed_deals(&db, &users, year).await?;

    println!("Seeding complete! Log in as admin@comptrack.dev / {DEMO_PASSWORD}");
    Ok(())
}

async fn seed_company(db: &DatabaseConnection) -> anyhow::Result<()> {
    let now = Utc::now().into();
    companies::ActiveModel {
        id: Set(DEMO_COMPANY_ID),
        name: Set("Demo Company".to_string()),
        currency: Set("USD".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn seed_users(db: &DatabaseConnection) -> anyhow::Result<SeededUsers> {
    let repo = UserRepository::new(db.clone());
    let password_hash = hash_password(DEMO_PASSWORD)?;

    let input = |email: &str, name: &str, role: UserRole, manager_id: Option<Uuid>| {
        CreateUserInput {
            company_id: DEMO_COMPANY_ID,
            email: email.to_string(),
            password_hash: password_hash.clone(),
            full_name: name.to_string(),
            role,
            sub_role: (role == UserRole::SalesRep).then(|| "ae".to_string()),
            is_admin: role == UserRole::Admin,
            is_manager: role == UserRole::Manager,
            manager_id,
        }
    };

    let admin = repo
        .create(input("admin@comptrack.dev", "Ada Admin", UserRole::Admin, None))
        .await?;
    let manager = repo
        .create(input(
            "manager@comptrack.dev",
            "Morgan Manager",
            UserRole::Manager,
            None,
        ))
        .await?;

    let mut reps = Vec::new();
    for (email, name) in [
        ("rep1@comptrack.dev", "Riley Rep"),
        ("rep2@comptrack.dev", "Sam Seller"),
    ] {
        let rep = repo
            .create(input(email, name, UserRole::SalesRep, Some(manager.id)))
            .await?;
        println!("  {email}");
        reps.push(rep.id);
    }

    Ok(SeededUsers {
        admin: admin.id,
        manager: manager.id,
        reps,
    })
}

async fn seed_targets(
    db: &DatabaseConnection,
    users: &SeededUsers,
    year: i32,
) -> anyhow::Result<()> {
    let repo = TargetRepository::new(db.clone());
    let Some(year_start) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        bail!("invalid year {year}");
    };
    let Some(period) = Period::containing(year_start, PeriodType::Annual) else {
        bail!("no annual period for {year}");
    };

    for rep in &users.reps {
        let annual = repo
            .create(NewTarget {
                company_id: DEMO_COMPANY_ID.into(),
                user_id: Some((*rep).into()),
                role: None,
                period,
                quota_amount: dec!(480000),
                commission_rate: dec!(0.08),
                parent_target_id: None,
            })
            .await?;
        let quarters = repo.split_annual(DEMO_COMPANY_ID, annual.id).await?;
        println!("  {} quarterly targets for {rep}", quarters.len());
    }

    let manager_target = repo
        .create(NewTarget {
            company_id: DEMO_COMPANY_ID.into(),
            user_id: None,
            role: Some("manager".to_string()),
            period,
            quota_amount: dec!(1200000),
            commission_rate: dec!(0.02),
            parent_target_id: None,
        })
        .await?;
    println!("  role target {} for managers", manager_target.id);

    Ok(())
}

async fn seed_deals(
    db: &DatabaseConnection,
    users: &SeededUsers,
    year: i32,
) -> anyhow::Result<()> {
    let repo = DealRepository::new(db.clone(), CommissionCalculator::default());

    let deals: [(&str, &str, Decimal, u32, ForecastCategory, bool); 5] = [
        ("crm-1001", "Acme renewal", dec!(42000), 2, ForecastCategory::Commit, true),
        ("crm-1002", "Globex expansion", dec!(18500), 3, ForecastCategory::Commit, true),
        ("crm-1003", "Initech pilot", dec!(7600), 5, ForecastCategory::BestCase, true),
        ("crm-1004", "Umbrella platform", dec!(96000), 8, ForecastCategory::Pipeline, false),
        ("crm-1005", "Stark upsell", dec!(23000), 11, ForecastCategory::BestCase, false),
    ];

    for (i, (crm_id, name, amount, month, category, won)) in deals.into_iter().enumerate() {
        let owner = users.reps[i % users.reps.len()];
        let Some(close_date) = NaiveDate::from_ymd_opt(year, month, 15) else {
            bail!("invalid close date for {crm_id}");
        };

        let synced = repo
            .sync_deal(
                SyncDealInput {
                    company_id: DEMO_COMPANY_ID,
                    user_id: owner,
                    crm_id: crm_id.to_string(),
                    name: name.to_string(),
                    amount,
                    close_date: Some(close_date),
                    status: DealStatus::Open,
                    forecast_category: Some(category),
                },
                users.admin,
            )
            .await?;

        if won {
            repo.close_won(DEMO_COMPANY_ID, synced.deal.id, Some(close_date), users.manager)
                .await?;
            println!("  {crm_id} closed won ({amount})");
        } else {
            println!("  {crm_id} open ({amount})");
        }
    }

    Ok(())
}
