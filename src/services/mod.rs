//! Service layer.

pub mod storage_service;
