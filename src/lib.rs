//! buildplan - dependency resolver and build planner library
//!
//! This library provides the core functionality for building Gradle-style
//! JVM projects:
//! - Build script parsing (build.gradle.kts, build.gradle)
//! - Dependency resolution with BOM/platform pins
//! - Build planning per goal and phase
//! - Phase execution with test discovery and running

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod execute;
pub mod manifest;
pub mod orchestrator;
pub mod output;
pub mod plan;
pub mod progress;
pub mod registry;
pub mod resolve;
