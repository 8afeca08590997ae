//! Shared test harness modules for the Tabula CLI.

use super::*;

mod unit;
