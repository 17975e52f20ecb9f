// src/models/mod.rs

pub mod proforma;
pub mod question;
pub mod response;
pub mod survey;
pub mod user;
