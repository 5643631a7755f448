// handlers/elevated/mod.rs - Elevated handlers (internal staff token required)
//
// Route Prefix: /api/internal/*
// Middleware: jwt_auth → require_internal. Not scoped to any organization.

pub mod organizations;

pub use organizations::{organization_plan_patch, organizations_get, organizations_post};
