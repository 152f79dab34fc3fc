// handlers/mod.rs - HTTP handlers
//
// system:  /, /health and the 404 fallback
// members: /api/setting/members/*

pub mod members;
pub mod system;
