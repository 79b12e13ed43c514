pub mod admin;
pub mod auth;
pub mod availability;
pub mod booking;
pub mod calendar;
pub mod catalog;
pub mod health;
pub mod public;
pub mod settings;
