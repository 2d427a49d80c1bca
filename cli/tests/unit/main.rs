//! Unit tests for the masterless CLI
//!
//! These tests use recording mocks for the remote host and real temp
//! directories for local inputs. Nothing leaves the machine.

mod plan_service;
mod provision_service;
mod transfer_service;
mod validate_service;
