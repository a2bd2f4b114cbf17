//! # Weather MCP Server Core
//!
//! Lookup pipeline and time operations shared by the weather and time tools.
//!
//! ## Features
//! - Place name to coordinates via the Open-Meteo geocoding API
//! - Hourly readings (temperature, humidity, dew point, conditions, wind,
//!   precipitation and more) via the Open-Meteo forecast API
//! - WMO weather code descriptions
//! - Timezone queries and conversions with automatic DST handling
//!
//! ## Modules
//! - `error`: Error taxonomy and MCP error mapping
//! - `forecast`: Hourly weather lookup and nearest-hour selection
//! - `geocoding`: Coordinate resolution for place names
//! - `models`: Tool requests, readings and results
//! - `time`: Timezone operations
//! - `utils`: Formatting and parsing helpers
//! - `weather_codes`: WMO code table

pub mod error;
pub mod forecast;
pub mod geocoding;
pub mod models;
pub mod time;
pub mod utils;
pub mod weather_codes;
