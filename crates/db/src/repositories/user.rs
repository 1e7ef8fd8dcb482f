//! User repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use comptrack_core::team::ReportingTree;

use crate::entities::{sea_orm_active_enums::UserRole, users};

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Company the user belongs to.
    pub company_id: Uuid,
    /// Login email.
    pub email: String,
    /// Argon2 hash of the password.
    pub password_hash: String,
    /// Display name.
    pub full_name: String,
    /// Sales role.
    pub role: UserRole,
    /// Optional sub-role such as "ae" or "sdr".
    pub sub_role: Option<String>,
    /// Admin flag.
    pub is_admin: bool,
    /// Manager flag.
    pub is_manager: bool,
    /// Direct manager.
    pub manager_id: Option<Uuid>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an active user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .filter(users::Column::IsActive.eq(true))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID within a company.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id)
            .filter(users::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await
    }

    /// Creates a new user. The email is stored lowercased.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::now_v7()),
            company_id: Set(input.company_id),
            email: Set(input.email.to_lowercase()),
            password_hash: Set(input.password_hash),
            full_name: Set(input.full_name),
            role: Set(input.role),
            sub_role: Set(input.sub_role),
            is_admin: Set(input.is_admin),
            is_manager: Set(input.is_manager),
            manager_id: Set(input.manager_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await
    }

    /// Lists active users of a company ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::CompanyId.eq(company_id))
            .filter(users::Column::IsActive.eq(true))
            .order_by_asc(users::Column::FullName)
            .all(&self.db)
            .await
    }

    /// Builds the company's reporting tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn reporting_tree(&self, company_id: Uuid) -> Result<ReportingTree, DbErr> {
        load_reporting_tree(&self.db, company_id).await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email.to_lowercase()))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}

/// Loads `(user, manager)` edges for a company, usable inside a transaction.
pub(crate) async fn load_reporting_tree<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
) -> Result<ReportingTree, DbErr> {
    let edges: Vec<(Uuid, Option<Uuid>)> = users::Entity::find()
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::ManagerId)
        .filter(users::Column::CompanyId.eq(company_id))
        .into_tuple()
        .all(conn)
        .await?;

    Ok(ReportingTree::from_edges(
        edges
            .into_iter()
            .map(|(user, manager)| (user.into(), manager.map(Into::into))),
    ))
}

/// Returns true if `user_id` belongs to `company_id`.
pub(crate) async fn is_company_user<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    user_id: Uuid,
) -> Result<bool, DbErr> {
    let count = users::Entity::find_by_id(user_id)
        .filter(users::Column::CompanyId.eq(company_id))
        .count(conn)
        .await?;
    Ok(count > 0)
}
