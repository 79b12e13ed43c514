pub mod auth_service;
pub mod availability;
pub mod booking_service;
pub mod calendar_service;
pub mod ics;
pub mod interval;
pub mod notification;
