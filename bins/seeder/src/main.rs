//! Database seeder for Imprest development and testing.
//!
//! Seeds the status and event-type lookups the ledger resolves against,
//! plus demo users for local development.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use imprest_core::ledger::EventCode;
use imprest_db::entities::{event_types, sea_orm_active_enums::UserRole, statuses, users};

/// Demo admin user ID (consistent for all seeds)
const DEMO_ADMIN_ID: &str = "00000000-0000-0000-0000-000000000001";
/// Demo finance officer ID (consistent for all seeds)
const DEMO_OFFICER_ID: &str = "00000000-0000-0000-0000-000000000002";
/// Demo employee ID (consistent for all seeds)
const DEMO_EMPLOYEE_ID: &str = "00000000-0000-0000-0000-000000000003";

/// Status lookup rows the ledger resolves against.
const STATUS_ROWS: &[(&str, &str, &str)] = &[
    ("ACT", "Active", "Normal active record"),
    ("INACT", "Inactive", "Deactivated record"),
    ("pending", "Pending", "Awaiting review and approval"),
    ("approved", "Approved", "Approved by a finance officer"),
    ("rejected", "Rejected", "Rejected by a finance officer"),
    ("disbursed", "Disbursed", "Cash handed out"),
    ("complete", "Complete", "Top-up credited into the account"),
    ("completed", "Completed", "Workflow finished"),
    ("under_review", "Under review", "Awaiting finance officer review"),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = imprest_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding statuses...");
    seed_statuses(&db).await;

    println!("Seeding event types...");
    seed_event_types(&db).await;

    println!("Seeding demo users...");
    seed_demo_users(&db).await;

    println!("Seeding complete!");
}

/// Seeds the status lookup rows.
async fn seed_statuses(db: &DatabaseConnection) {
    for (code, name, description) in STATUS_ROWS {
        let exists = statuses::Entity::find()
            .filter(statuses::Column::Code.eq(*code))
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some();
        if exists {
            continue;
        }

        let row = statuses::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set((*code).to_string()),
            name: Set((*name).to_string()),
            description: Set(Some((*description).to_string())),
            created_at: Set(Utc::now().into()),
        };

        if let Err(e) = row.insert(db).await {
            eprintln!("Failed to insert status {code}: {e}");
        } else {
            println!("  Created status: {code}");
        }
    }
}

/// Seeds one event-type row per audit event code.
async fn seed_event_types(db: &DatabaseConnection) {
    for event in EventCode::all() {
        let exists = event_types::Entity::find()
            .filter(event_types::Column::Code.eq(event.as_str()))
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some();
        if exists {
            continue;
        }

        let row = event_types::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(event.as_str().to_string()),
            name: Set(event.name().to_string()),
            category: Set(event.category().as_str().to_string()),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
        };

        if let Err(e) = row.insert(db).await {
            eprintln!("Failed to insert event type {event}: {e}");
        } else {
            println!("  Created event type: {event}");
        }
    }
}

/// Seeds demo users for local development.
async fn seed_demo_users(db: &DatabaseConnection) {
    let demo_users = [
        (DEMO_ADMIN_ID, "admin@imprest.dev", "Demo Admin", UserRole::Admin),
        (
            DEMO_OFFICER_ID,
            "officer@imprest.dev",
            "Demo Finance Officer",
            UserRole::FinanceOfficer,
        ),
        (
            DEMO_EMPLOYEE_ID,
            "employee@imprest.dev",
            "Demo Employee",
            UserRole::Employee,
        ),
    ];

    for (id, email, full_name, role) in demo_users {
        let user_id = Uuid::parse_str(id).expect("Demo user id is a valid UUID");
        let exists = users::Entity::find_by_id(user_id)
            .one(db)
            .await
            .ok()
            .flatten()
            .is_some();
        if exists {
            println!("  User {email} already exists, skipping...");
            continue;
        }

        let user = users::ActiveModel {
            id: Set(user_id),
            email: Set(email.to_string()),
            full_name: Set(full_name.to_string()),
            role: Set(role),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        };

        if let Err(e) = user.insert(db).await {
            eprintln!("Failed to insert user {email}: {e}");
        } else {
            println!("  Created user: {email}");
        }
    }
}
