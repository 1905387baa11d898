pub mod erp;
pub mod error;
pub mod rest;
