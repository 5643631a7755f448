// handlers/mod.rs - 3-tier handler architecture
//
// Public (no auth) → Protected (JWT + organization member) → Elevated (JWT + internal claim)

pub mod elevated; // /api/internal/*
pub mod protected; // /api/*
pub mod public; // /, /health, /plans, /invites/*, /embed/*, /webhooks/*
