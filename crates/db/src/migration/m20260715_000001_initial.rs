//! Initial schema: users, lookups, petty-cash accounts, the three workflow
//! tables, the append-only transaction log, and notifications.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            r"
DROP TABLE IF EXISTS notifications CASCADE;
DROP TABLE IF EXISTS transaction_logs CASCADE;
DROP TABLE IF EXISTS disbursement_reconciliations CASCADE;
DROP TABLE IF EXISTS topup_requests CASCADE;
DROP TABLE IF EXISTS expense_requests CASCADE;
DROP TABLE IF EXISTS petty_cash_accounts CASCADE;
DROP TABLE IF EXISTS event_types CASCADE;
DROP TABLE IF EXISTS statuses CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TYPE IF EXISTS notification_channel;
DROP TYPE IF EXISTS reconciliation_status;
DROP TYPE IF EXISTS topup_status;
DROP TYPE IF EXISTS expense_type;
DROP TYPE IF EXISTS expense_status;
DROP TYPE IF EXISTS user_role;
",
        )
        .await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r"
-- Enum types
CREATE TYPE user_role AS ENUM ('employee', 'finance_officer', 'admin');
CREATE TYPE expense_status AS ENUM ('pending', 'approved', 'rejected', 'disbursed', 'completed', 'INACT');
CREATE TYPE expense_type AS ENUM ('reimbursement', 'disbursement');
CREATE TYPE topup_status AS ENUM ('pending', 'approved', 'rejected', 'complete', 'INACT');
CREATE TYPE reconciliation_status AS ENUM ('pending', 'under_review', 'completed', 'INACT');
CREATE TYPE notification_channel AS ENUM ('in_app', 'sms', 'email');

-- Users (identity only; authentication is upstream)
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    role user_role NOT NULL DEFAULT 'employee',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Status lookup, resolved by the ledger at write time
CREATE TABLE statuses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code VARCHAR(30) NOT NULL UNIQUE,
    name VARCHAR(100) NOT NULL,
    description VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Event type lookup, resolved by the ledger at write time
CREATE TABLE event_types (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code VARCHAR(64) NOT NULL UNIQUE,
    name VARCHAR(100) NOT NULL,
    category VARCHAR(30) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Petty-cash accounts; at most one active account at a time
CREATE TABLE petty_cash_accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(100) NOT NULL,
    description VARCHAR(255),
    account_type VARCHAR(20) NOT NULL DEFAULT 'mpesa',
    phone_number VARCHAR(20) NOT NULL,
    current_balance NUMERIC(15, 2) NOT NULL DEFAULT 0,
    minimum_threshold NUMERIC(15, 2) NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_balance_non_negative CHECK (current_balance >= 0),
    CONSTRAINT chk_threshold_non_negative CHECK (minimum_threshold >= 0)
);

-- The single-active-account policy, enforced at the database too
CREATE UNIQUE INDEX idx_petty_cash_single_active
    ON petty_cash_accounts ((TRUE)) WHERE is_active;

-- Expense requests
CREATE TABLE expense_requests (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    employee_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    expense_type expense_type NOT NULL DEFAULT 'reimbursement',
    status expense_status NOT NULL DEFAULT 'pending',
    title VARCHAR(100) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    phone_number VARCHAR(20),
    amount NUMERIC(15, 2) NOT NULL,
    receipt_urls JSONB NOT NULL DEFAULT '[]',
    metadata JSONB NOT NULL DEFAULT '{}',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_expense_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_expense_requests_employee ON expense_requests(employee_id, created_at DESC);
CREATE INDEX idx_expense_requests_status ON expense_requests(status) WHERE is_active;

-- Top-up requests; requested_by is NULL for auto-triggered rows
CREATE TABLE topup_requests (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    account_id UUID NOT NULL REFERENCES petty_cash_accounts(id) ON DELETE RESTRICT,
    requested_by UUID REFERENCES users(id) ON DELETE RESTRICT,
    decision_by UUID REFERENCES users(id) ON DELETE RESTRICT,
    status topup_status NOT NULL DEFAULT 'pending',
    amount NUMERIC(15, 2) NOT NULL,
    request_reason VARCHAR(255) NOT NULL DEFAULT '',
    decision_reason VARCHAR(255),
    is_auto_triggered BOOLEAN NOT NULL DEFAULT FALSE,
    metadata JSONB NOT NULL DEFAULT '{}',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_topup_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_topup_requests_account ON topup_requests(account_id, created_at DESC);
CREATE INDEX idx_topup_requests_status ON topup_requests(status) WHERE is_active;

-- Disbursement reconciliations, 1:1 with a disbursed expense request
CREATE TABLE disbursement_reconciliations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    expense_request_id UUID NOT NULL UNIQUE REFERENCES expense_requests(id) ON DELETE CASCADE,
    submitted_by UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    approved_by UUID REFERENCES users(id) ON DELETE RESTRICT,
    approved_at TIMESTAMPTZ,
    status reconciliation_status NOT NULL DEFAULT 'pending',
    total_amount NUMERIC(15, 2) NOT NULL,
    reconciled_amount NUMERIC(15, 2),
    surplus_returned NUMERIC(15, 2),
    receipt_urls JSONB,
    comments TEXT,
    metadata JSONB NOT NULL DEFAULT '{}',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_reconciled_within_total
        CHECK (reconciled_amount IS NULL OR reconciled_amount <= total_amount)
);

CREATE INDEX idx_reconciliations_submitter ON disbursement_reconciliations(submitted_by, created_at DESC);
CREATE INDEX idx_reconciliations_status ON disbursement_reconciliations(status) WHERE is_active;

-- Append-only audit trail; rows are never updated or deleted
CREATE TABLE transaction_logs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    event_type_id UUID NOT NULL REFERENCES event_types(id) ON DELETE RESTRICT,
    status_id UUID NOT NULL REFERENCES statuses(id) ON DELETE RESTRICT,
    triggered_by UUID REFERENCES users(id) ON DELETE SET NULL,
    event_message VARCHAR(255) NOT NULL DEFAULT '',
    metadata JSONB,
    entity_type VARCHAR(50) NOT NULL,
    entity_id VARCHAR(100) NOT NULL,
    ip_address VARCHAR(45),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_transaction_logs_entity ON transaction_logs(entity_type, entity_id);
CREATE INDEX idx_transaction_logs_user ON transaction_logs(triggered_by);
CREATE INDEX idx_transaction_logs_created ON transaction_logs(created_at DESC);

-- Notifications; RESTRICT protects the referenced log entry from deletion
CREATE TABLE notifications (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    transaction_log_id UUID NOT NULL REFERENCES transaction_logs(id) ON DELETE RESTRICT,
    recipient_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    channel notification_channel NOT NULL DEFAULT 'in_app',
    is_read BOOLEAN NOT NULL DEFAULT FALSE,
    read_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_notifications_inbox ON notifications(recipient_id, is_read, created_at DESC);
";
