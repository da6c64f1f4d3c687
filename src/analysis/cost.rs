//! Cost estimation from injected pricing.
//!
//! Pricing is external configuration: CLI flags or a TOML file, never a
//! hard-coded constant. The defaults below are placeholders for callers
//! that supply nothing; production deployments should inject real prices
//! per analysis run.

use crate::model::schema::CostEntry;
use crate::model::unified::UnifiedGasModel;
use crate::utils::config::{
    DEFAULT_GAS_PRICE_GWEI, DEFAULT_NATIVE_USD_PRICE, TOP_COST_ENTRIES, WEI_PER_GWEI,
    WEI_PER_NATIVE,
};
use crate::utils::error::PricingError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Externally supplied pricing inputs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Gas price in gwei
    pub gas_price_gwei: f64,

    /// USD price of one native-currency unit
    pub native_usd_price: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            gas_price_gwei: DEFAULT_GAS_PRICE_GWEI,
            native_usd_price: DEFAULT_NATIVE_USD_PRICE,
        }
    }
}

impl PricingConfig {
    /// Native-currency cost of a gas amount:
    /// `gas * gas_price_gwei * 1e9 / 1e18`
    pub fn cost_native(&self, gas: u64) -> f64 {
        gas as f64 * self.gas_price_gwei * WEI_PER_GWEI / WEI_PER_NATIVE
    }

    /// USD cost of a gas amount
    pub fn cost_usd(&self, gas: u64) -> f64 {
        self.cost_native(gas) * self.native_usd_price
    }

    /// Reject negative or non-finite prices
    pub fn validate(&self) -> Result<(), PricingError> {
        if !self.gas_price_gwei.is_finite() || self.gas_price_gwei < 0.0 {
            return Err(PricingError::InvalidValue(format!(
                "gas_price_gwei must be a non-negative number, got {}",
                self.gas_price_gwei
            )));
        }
        if !self.native_usd_price.is_finite() || self.native_usd_price < 0.0 {
            return Err(PricingError::InvalidValue(format!(
                "native_usd_price must be a non-negative number, got {}",
                self.native_usd_price
            )));
        }
        Ok(())
    }
}

/// Load pricing configuration from a TOML file
///
/// **Public** - used by the analyze command
///
/// # Errors
/// * `PricingError::IoError` - File cannot be read
/// * `PricingError::TomlError` - TOML is invalid
/// * `PricingError::InvalidValue` - Negative or non-finite prices
pub fn load_pricing(path: impl AsRef<Path>) -> Result<PricingConfig, PricingError> {
    let contents = fs::read_to_string(path)?;
    let config: PricingConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

/// Estimate costs for the top gas-consuming entries.
///
/// **Public** - consumes the unified model
///
/// Uses per-contract attribution when a call trace is present, else the
/// category breakdown. Entries are sorted descending by USD cost.
pub fn estimate_costs(model: &UnifiedGasModel, pricing: &PricingConfig) -> Vec<CostEntry> {
    let candidates: Vec<(String, u64)> = if !model.contract_entries.is_empty() {
        model
            .contract_entries
            .iter()
            .map(|e| {
                let label = e.label.clone().unwrap_or_else(|| e.address.clone());
                (label, e.gas_used)
            })
            .collect()
    } else {
        model
            .category_totals
            .iter()
            .map(|c| (c.label.clone(), c.gas_used))
            .collect()
    };

    debug!("Estimating costs for {} entries", candidates.len());

    let mut entries: Vec<CostEntry> = candidates
        .into_iter()
        .map(|(label, gas_used)| CostEntry {
            label,
            gas_used,
            cost_native: pricing.cost_native(gas_used),
            cost_usd: pricing.cost_usd(gas_used),
        })
        .collect();

    entries.sort_by(|a, b| {
        b.cost_usd
            .partial_cmp(&a.cost_usd)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    entries.truncate(TOP_COST_ENTRIES);
    entries
}
