//! EPUB OCR Server Library
//!
//! Extracts the reading text of an EPUB plus text recognized in its embedded
//! images. The HTTP binary is in main.rs.
//!
//! # Modules
//!
//! - `epub`: package parsing and markup stripping
//! - `ocr`: OCR engines, worker and bounded pool
//! - `extract`: image pipeline and transcript assembly
//! - `routes`: HTTP endpoints

pub mod config;
pub mod epub;
pub mod error;
pub mod extract;
pub mod ocr;
pub mod routes;
pub mod state;

#[cfg(test)]
mod test_support;
