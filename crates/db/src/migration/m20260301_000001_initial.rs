//! Initial database migration.
//!
//! Creates the enums, tables, constraints, and triggers for companies,
//! users, targets, deals, commissions, and their audit trail.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: EXTENSIONS & ENUMS
        // ============================================================
        db.execute_unprepared(EXTENSIONS_SQL).await?;
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: COMPANIES & USERS
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: TARGETS & DEALS
        // ============================================================
        db.execute_unprepared(TARGETS_SQL).await?;
        db.execute_unprepared(DEALS_SQL).await?;

        // ============================================================
        // PART 4: COMMISSIONS
        // ============================================================
        db.execute_unprepared(COMMISSIONS_SQL).await?;
        db.execute_unprepared(COMMISSION_PERIODS_SQL).await?;
        db.execute_unprepared(COMMISSION_APPROVALS_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const EXTENSIONS_SQL: &str = r"
-- Needed for the target overlap exclusion constraint (uuid/enum equality in GiST)
CREATE EXTENSION IF NOT EXISTS btree_gist;
";

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM ('admin', 'manager', 'sales_rep');

CREATE TYPE period_type AS ENUM ('monthly', 'quarterly', 'annual');

CREATE TYPE deal_status AS ENUM ('open', 'closed_won', 'closed_lost');

CREATE TYPE forecast_category AS ENUM ('pipeline', 'best_case', 'commit', 'omitted');

CREATE TYPE commission_status AS ENUM (
    'calculated',
    'pending_review',
    'approved',
    'rejected',
    'paid'
);

CREATE TYPE commission_kind AS ENUM ('actual', 'projected');

CREATE TYPE approval_action AS ENUM (
    'calculate',
    'recalculate',
    'submit',
    'approve',
    'reject',
    'adjust',
    'mark_paid'
);
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    currency CHAR(3) NOT NULL DEFAULT 'USD',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    full_name VARCHAR(255) NOT NULL,
    role user_role NOT NULL DEFAULT 'sales_rep',
    sub_role VARCHAR(50),
    is_admin BOOLEAN NOT NULL DEFAULT false,
    is_manager BOOLEAN NOT NULL DEFAULT false,
    manager_id UUID REFERENCES users(id) ON DELETE SET NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_not_own_manager CHECK (manager_id IS NULL OR manager_id <> id)
);

CREATE INDEX idx_users_company ON users(company_id);
CREATE INDEX idx_users_manager ON users(manager_id) WHERE manager_id IS NOT NULL;
";

const TARGETS_SQL: &str = r"
CREATE TABLE targets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    user_id UUID REFERENCES users(id) ON DELETE CASCADE,
    role VARCHAR(50),
    period_type period_type NOT NULL,
    period_start DATE NOT NULL,
    period_end DATE NOT NULL,
    quota_amount NUMERIC(19, 4) NOT NULL,
    commission_rate NUMERIC(7, 6) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    parent_target_id UUID REFERENCES targets(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_target_scope CHECK (user_id IS NOT NULL OR role IS NOT NULL),
    CONSTRAINT chk_target_period CHECK (period_end >= period_start),
    CONSTRAINT chk_target_quota CHECK (quota_amount >= 0),
    CONSTRAINT chk_target_rate CHECK (commission_rate >= 0 AND commission_rate <= 1),
    -- One active target per user per overlapping period of the same type
    CONSTRAINT excl_target_user_overlap EXCLUDE USING gist (
        user_id WITH =,
        period_type WITH =,
        daterange(period_start, period_end, '[]') WITH &&
    ) WHERE (is_active AND user_id IS NOT NULL)
);

CREATE INDEX idx_targets_user_period ON targets(user_id, period_start, period_end) WHERE is_active;
CREATE INDEX idx_targets_role ON targets(company_id, role) WHERE user_id IS NULL AND is_active;
CREATE INDEX idx_targets_parent ON targets(parent_target_id) WHERE parent_target_id IS NOT NULL;
";

const DEALS_SQL: &str = r"
CREATE TABLE deals (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    crm_id VARCHAR(100),
    name VARCHAR(255) NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    close_date DATE,
    status deal_status NOT NULL DEFAULT 'open',
    forecast_category forecast_category,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_deal_amount CHECK (amount >= 0),
    CONSTRAINT chk_won_has_close_date CHECK (status <> 'closed_won' OR close_date IS NOT NULL),
    CONSTRAINT uq_deals_crm UNIQUE (crm_id, company_id)
);

CREATE INDEX idx_deals_user_close ON deals(user_id, close_date);
CREATE INDEX idx_deals_status ON deals(company_id, status);
";

const COMMISSIONS_SQL: &str = r"
CREATE TABLE commissions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    deal_id UUID NOT NULL UNIQUE REFERENCES deals(id) ON DELETE CASCADE,
    target_id UUID REFERENCES targets(id) ON DELETE SET NULL,
    deal_amount NUMERIC(19, 4) NOT NULL,
    commission_rate NUMERIC(7, 6) NOT NULL,
    commission_amount NUMERIC(19, 4) NOT NULL,
    close_date DATE NOT NULL,
    period_type period_type NOT NULL,
    period_start DATE NOT NULL,
    period_end DATE NOT NULL,
    status commission_status NOT NULL DEFAULT 'calculated',
    calculated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    reviewed_at TIMESTAMPTZ,
    approved_at TIMESTAMPTZ,
    paid_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_commission_amount CHECK (commission_amount >= 0),
    CONSTRAINT chk_commission_paid_at CHECK (status <> 'paid' OR paid_at IS NOT NULL)
);

CREATE INDEX idx_commissions_user_close ON commissions(user_id, close_date);
CREATE INDEX idx_commissions_status ON commissions(company_id, status);
";

const COMMISSION_PERIODS_SQL: &str = r"
CREATE TABLE commission_periods (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    kind commission_kind NOT NULL,
    period_type period_type NOT NULL,
    period_start DATE NOT NULL,
    period_end DATE NOT NULL,
    quota_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    commission_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    attainment_percent NUMERIC(9, 2) NOT NULL DEFAULT 0,
    target_id UUID REFERENCES targets(id) ON DELETE SET NULL,
    calculated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_commission_period UNIQUE (user_id, kind, period_start, period_end)
);
";

const COMMISSION_APPROVALS_SQL: &str = r"
-- Append-only audit trail, one row per status transition
CREATE TABLE commission_approvals (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    commission_id UUID NOT NULL REFERENCES commissions(id) ON DELETE CASCADE,
    action approval_action NOT NULL,
    performed_by UUID NOT NULL REFERENCES users(id),
    previous_status commission_status,
    new_status commission_status NOT NULL,
    notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_commission_approvals_commission ON commission_approvals(commission_id, created_at);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_paid_modification
-- Paid commissions are immutable
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_paid_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.status = 'paid' THEN
        RAISE EXCEPTION 'Cannot modify paid commission %', OLD.id;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_paid_mod
BEFORE UPDATE ON commissions
FOR EACH ROW
EXECUTE FUNCTION prevent_paid_modification();

-- ============================================================
-- FUNCTION: prevent_audit_modification
-- Audit rows are append-only
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_audit_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'commission_approvals is append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_audit_update
BEFORE UPDATE ON commission_approvals
FOR EACH ROW
EXECUTE FUNCTION prevent_audit_modification();
";

const DROP_ALL_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_prevent_audit_update ON commission_approvals;
DROP TRIGGER IF EXISTS trg_prevent_paid_mod ON commissions;

DROP FUNCTION IF EXISTS prevent_audit_modification();
DROP FUNCTION IF EXISTS prevent_paid_modification();

DROP TABLE IF EXISTS commission_approvals CASCADE;
DROP TABLE IF EXISTS commission_periods CASCADE;
DROP TABLE IF EXISTS commissions CASCADE;
DROP TABLE IF EXISTS deals CASCADE;
DROP TABLE IF EXISTS targets CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS companies CASCADE;

DROP TYPE IF EXISTS approval_action CASCADE;
DROP TYPE IF EXISTS commission_kind CASCADE;
DROP TYPE IF EXISTS commission_status CASCADE;
DROP TYPE IF EXISTS forecast_category CASCADE;
DROP TYPE IF EXISTS deal_status CASCADE;
DROP TYPE IF EXISTS period_type CASCADE;
DROP TYPE IF EXISTS user_role CASCADE;
";
