pub mod document_service;
pub mod extract;
pub mod health_service;
