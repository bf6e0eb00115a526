//! Environment variable handling and .env file management

use crate::error::{AppError, Result};
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load .env file if it exists. Returns whether a file was loaded.
    pub fn load_env_file() -> Result<bool> {
        if !Path::new(".env").exists() {
            return Ok(false);
        }

        dotenv::from_filename(".env")
            .map_err(|e| AppError::config(format!("Failed to load .env file: {}", e)))?;
        Ok(true)
    }
}
