//! Public transport line server.
//!
//! Loads a static GTFS feed, groups each line's trips into path variants,
//! and answers "which variant is this vehicle on?" from a live position.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod feed;
pub mod index;
pub mod schedule;
pub mod service;
pub mod vehicles;
pub mod web;
