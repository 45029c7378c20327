//! Initial database migration.
//!
//! Creates the gated document tables, the approval workflow tables, the
//! pending-uniqueness index the engine relies on, and RLS policies for
//! company isolation.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: DIRECTORY
        // ============================================================
        db.execute_unprepared(GROUPS_SQL).await?;

        // ============================================================
        // PART 2: GATED DOCUMENTS
        // ============================================================
        db.execute_unprepared(QUALITY_DOCUMENTS_SQL).await?;
        db.execute_unprepared(PURCHASE_ORDERS_SQL).await?;

        // ============================================================
        // PART 3: APPROVAL WORKFLOW
        // ============================================================
        db.execute_unprepared(APPROVAL_RULES_SQL).await?;
        db.execute_unprepared(APPROVAL_REQUESTS_SQL).await?;

        // ============================================================
        // PART 4: ROW-LEVEL SECURITY
        // ============================================================
        db.execute_unprepared(RLS_SQL).await?;

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

const GROUPS_SQL: &str = r"
-- Approver directory. Org-linked groups mirror external parties and
-- are excluded when listing approver candidates.
CREATE TABLE groups (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL,
    name TEXT NOT NULL,
    is_customer_org_group BOOLEAN NOT NULL DEFAULT FALSE,
    is_supplier_org_group BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_groups_company_name UNIQUE (company_id, name)
);

CREATE INDEX idx_groups_company ON groups(company_id);
";

const QUALITY_DOCUMENTS_SQL: &str = r"
CREATE TABLE quality_documents (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL,
    name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft',
    version INTEGER NOT NULL DEFAULT 1,
    content TEXT,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by UUID,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_quality_documents_status
        CHECK (status IN ('draft', 'active', 'archived')),
    CONSTRAINT chk_quality_documents_version CHECK (version >= 1)
);

CREATE INDEX idx_quality_documents_company ON quality_documents(company_id);
CREATE INDEX idx_quality_documents_status ON quality_documents(company_id, status);
";

const PURCHASE_ORDERS_SQL: &str = r"
CREATE TABLE purchase_orders (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL,
    reference TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft',
    total_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    currency_code CHAR(3) NOT NULL DEFAULT 'USD',
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by UUID,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_purchase_orders_reference UNIQUE (company_id, reference),
    CONSTRAINT chk_purchase_orders_status
        CHECK (status IN ('draft', 'toReview', 'approved', 'rejected')),
    CONSTRAINT chk_purchase_orders_amount CHECK (total_amount >= 0)
);

CREATE INDEX idx_purchase_orders_company ON purchase_orders(company_id);
CREATE INDEX idx_purchase_orders_status ON purchase_orders(company_id, status);
";

const APPROVAL_RULES_SQL: &str = r"
-- Amount-banded approval configuration. Bands are [lower, upper) with a
-- NULL upper bound meaning unbounded above.
CREATE TABLE approval_rules (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL,
    document_type TEXT NOT NULL,
    enabled BOOLEAN NOT NULL DEFAULT TRUE,
    approver_group_ids UUID[] NOT NULL DEFAULT '{}',
    default_approver_id UUID,
    lower_bound_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    upper_bound_amount NUMERIC(15, 2),
    escalation_days INTEGER,
    blocking BOOLEAN NOT NULL DEFAULT FALSE,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_by UUID,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_approval_rules_document_type
        CHECK (document_type IN ('purchaseOrder', 'qualityDocument')),
    CONSTRAINT chk_approval_rules_lower_bound CHECK (lower_bound_amount >= 0),
    CONSTRAINT chk_approval_rules_band
        CHECK (upper_bound_amount IS NULL OR lower_bound_amount < upper_bound_amount),
    CONSTRAINT chk_approval_rules_escalation
        CHECK (escalation_days IS NULL OR escalation_days > 0)
);

CREATE INDEX idx_approval_rules_company ON approval_rules(company_id);
CREATE INDEX idx_approval_rules_lookup
    ON approval_rules(company_id, document_type) WHERE enabled;
";

const APPROVAL_REQUESTS_SQL: &str = r"
-- Approval state machine rows. The recipient columns are a snapshot of
-- the matched rule at trigger time.
CREATE TABLE approval_requests (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL,
    document_type TEXT NOT NULL,
    document_id UUID NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    requested_by UUID NOT NULL,
    created_by UUID NOT NULL,
    approver_group_ids UUID[] NOT NULL DEFAULT '{}',
    approver_id UUID,
    decision_notes TEXT,
    decided_at TIMESTAMPTZ,
    decided_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_approval_requests_document_type
        CHECK (document_type IN ('purchaseOrder', 'qualityDocument')),
    CONSTRAINT chk_approval_requests_status
        CHECK (status IN ('pending', 'approved', 'rejected', 'cancelled')),
    -- A decided row carries its audit trail.
    CONSTRAINT chk_approval_requests_decision
        CHECK (status = 'pending' OR (decided_at IS NOT NULL AND decided_by IS NOT NULL))
);

-- At most one pending request per document. Concurrent triggers race on
-- this index; the loser maps the violation to a benign no-op.
CREATE UNIQUE INDEX ux_approval_requests_pending
    ON approval_requests(document_type, document_id)
    WHERE status = 'pending';

CREATE INDEX idx_approval_requests_company ON approval_requests(company_id);
CREATE INDEX idx_approval_requests_document
    ON approval_requests(document_type, document_id);
CREATE INDEX idx_approval_requests_status ON approval_requests(company_id, status);
";

const RLS_SQL: &str = r"
-- ============================================================
-- ROW-LEVEL SECURITY POLICIES
-- Company isolation for caller-scoped connections. The service role
-- bypasses these (BYPASSRLS); the approval engine's stores run under
-- it to read and write requests across caller boundaries.
-- ============================================================

ALTER TABLE groups ENABLE ROW LEVEL SECURITY;
ALTER TABLE quality_documents ENABLE ROW LEVEL SECURITY;
ALTER TABLE purchase_orders ENABLE ROW LEVEL SECURITY;
ALTER TABLE approval_rules ENABLE ROW LEVEL SECURITY;
ALTER TABLE approval_requests ENABLE ROW LEVEL SECURITY;

ALTER TABLE groups FORCE ROW LEVEL SECURITY;
ALTER TABLE quality_documents FORCE ROW LEVEL SECURITY;
ALTER TABLE purchase_orders FORCE ROW LEVEL SECURITY;
ALTER TABLE approval_rules FORCE ROW LEVEL SECURITY;
ALTER TABLE approval_requests FORCE ROW LEVEL SECURITY;

-- Application sets context before queries:
-- SET LOCAL app.current_company_id = 'company-uuid';

CREATE POLICY company_isolation ON groups
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

CREATE POLICY company_isolation ON quality_documents
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

CREATE POLICY company_isolation ON purchase_orders
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

CREATE POLICY company_isolation ON approval_rules
    USING (company_id = current_setting('app.current_company_id', true)::UUID);

CREATE POLICY company_isolation ON approval_requests
    USING (company_id = current_setting('app.current_company_id', true)::UUID);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS approval_requests CASCADE;
DROP TABLE IF EXISTS approval_rules CASCADE;
DROP TABLE IF EXISTS purchase_orders CASCADE;
DROP TABLE IF EXISTS quality_documents CASCADE;
DROP TABLE IF EXISTS groups CASCADE;
";
