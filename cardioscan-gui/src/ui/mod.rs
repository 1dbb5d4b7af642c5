//! # UI Module
//!
//! This module contains the layout of the CardioScan application window.

pub mod main_display;
